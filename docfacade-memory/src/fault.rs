//! Fault injection for the in-memory driver.
//!
//! Lets tests simulate an unreachable server, transient operation failures and
//! slow connects, and observe how often each driver call was made.

use std::{collections::HashMap, fmt, time::Duration};

use docfacade_core::error::{FacadeError, FacadeResult};


/// Driver calls that can be counted or made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriverOperation {
    Connect,
    Ping,
    Disconnect,
    FindOne,
    Find,
    InsertOne,
    UpdateOne,
    ReplaceOne,
    DeleteOne,
    DeleteMany,
}

impl fmt::Display for DriverOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DriverOperation::Connect => "connect",
            DriverOperation::Ping => "ping",
            DriverOperation::Disconnect => "disconnect",
            DriverOperation::FindOne => "find_one",
            DriverOperation::Find => "find",
            DriverOperation::InsertOne => "insert_one",
            DriverOperation::UpdateOne => "update_one",
            DriverOperation::ReplaceOne => "replace_one",
            DriverOperation::DeleteOne => "delete_one",
            DriverOperation::DeleteMany => "delete_many",
        };

        f.write_str(name)
    }
}

#[derive(Debug)]
pub(crate) struct FaultPlan {
    pub(crate) reachable: bool,
    pub(crate) connect_delay: Duration,
    pub(crate) last_uri: Option<String>,
    pending_failures: HashMap<DriverOperation, u32>,
    calls: HashMap<DriverOperation, u32>,
}

impl Default for FaultPlan {
    fn default() -> Self {
        Self {
            reachable: true,
            connect_delay: Duration::ZERO,
            last_uri: None,
            pending_failures: HashMap::new(),
            calls: HashMap::new(),
        }
    }
}

impl FaultPlan {
    pub(crate) fn fail_next(&mut self, operation: DriverOperation, times: u32) {
        self.pending_failures.insert(operation, times);
    }

    pub(crate) fn calls(&self, operation: DriverOperation) -> u32 {
        self.calls
            .get(&operation)
            .copied()
            .unwrap_or(0)
    }

    /// Records a call and decides whether it fails.
    ///
    /// An unreachable server fails every call except `disconnect`.
    pub(crate) fn record(&mut self, operation: DriverOperation) -> FacadeResult<()> {
        *self.calls.entry(operation).or_default() += 1;

        if !self.reachable && operation != DriverOperation::Disconnect {
            return Err(match operation {
                DriverOperation::Connect => FacadeError::Connection("server selection failed: no reachable servers".into()),
                _ => FacadeError::Driver("server is unreachable".into()),
            });
        }

        if let Some(remaining) = self.pending_failures.get_mut(&operation) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(match operation {
                    DriverOperation::Connect => FacadeError::Connection(format!("injected {} failure", operation)),
                    _ => FacadeError::Driver(format!("injected {} failure", operation)),
                });
            }
        }

        Ok(())
    }
}
