//! Translation from docfacade options to MongoDB driver options.

use mongodb::options::{
    DeleteOptions as MongoDeleteOptions, FindOptions as MongoFindOptions, Hint,
    InsertOneOptions as MongoInsertOneOptions, ReplaceOptions as MongoReplaceOptions,
    UpdateOptions as MongoUpdateOptions,
};

use docfacade_core::options::{
    DeleteOptions, FindOptions, InsertOneOptions, ReplaceOptions, UpdateOptions,
};


pub(crate) fn find_options(options: FindOptions) -> MongoFindOptions {
    let mut translated = MongoFindOptions::default();

    translated.limit = options.limit;
    translated.skip = options.skip;
    translated.sort = options.sort;
    translated.projection = options.projection;

    translated
}

pub(crate) fn insert_one_options(options: InsertOneOptions) -> MongoInsertOneOptions {
    let mut translated = MongoInsertOneOptions::default();
    translated.bypass_document_validation = options.bypass_document_validation;

    translated
}

pub(crate) fn update_options(options: UpdateOptions) -> MongoUpdateOptions {
    let mut translated = MongoUpdateOptions::default();
    translated.upsert = options.upsert;

    translated
}

pub(crate) fn replace_options(options: ReplaceOptions) -> MongoReplaceOptions {
    let mut translated = MongoReplaceOptions::default();
    translated.upsert = options.upsert;

    translated
}

pub(crate) fn delete_options(options: DeleteOptions) -> MongoDeleteOptions {
    let mut translated = MongoDeleteOptions::default();
    translated.hint = options.hint.map(Hint::Keys);

    translated
}
