//! Fetches the Our World in Data COVID-19 dataset and hands it back as JSON.

pub mod constants;
pub mod covid;
pub mod error;

pub use constants::OWID_COVID_DATA_URL;
pub use covid::{fetch_data, DataFetcher, HttpsClient, MAX_REDIRECTS};
pub use error::{BoxError, FetchError, Result};
