use hyper::Uri;
use once_cell::sync::Lazy;

pub const OWID_COVID_DATA_URL: &str = "https://covid.ourworldindata.org/data/owid-covid-data.json";

pub static OWID_COVID_DATA_URI: Lazy<Uri> = Lazy::new(||
    Uri::from_static(OWID_COVID_DATA_URL)
);
