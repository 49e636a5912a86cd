// Domain core: model, errors, codes, credentials

pub mod codes;
pub mod credentials;
pub mod errors;
pub mod models;
pub mod validation;
