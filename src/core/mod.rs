pub mod mapper;
pub mod registry;
pub mod request;
pub mod resolver;
pub mod zip_code;

pub use crate::domain::model::{
    Country, RawResponse, ResultFormat, ServiceResult, WebServiceConfig, ZipValue,
};
pub use crate::domain::ports::{CountryRepository, HttpClient};
pub use crate::utils::error::Result;
