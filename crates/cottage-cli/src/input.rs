//! Command-line input translation
//!
//! Users give dates as `DD.MM.YYYY`; the catalog only takes normalized
//! dates, so conversion happens here.

use chrono::NaiveDate;
use clap::Args;
use cottage_core::Cottage;

const INPUT_DATE_FORMAT: &str = "%d.%m.%Y";

/// Parse a `DD.MM.YYYY` date
pub fn parse_day(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), INPUT_DATE_FORMAT)
        .map_err(|e| format!("expected a date as DD.MM.YYYY, got {value:?}: {e}"))
}

/// Cottage fields for add and update
#[derive(Args, Debug, Clone)]
pub struct CottageArgs {
    /// Cottage identifier
    #[arg(long)]
    pub id: String,

    #[arg(long)]
    pub address: Option<String>,

    #[arg(long = "image-url")]
    pub image_url: Option<String>,

    /// Number of guests
    #[arg(long, default_value_t = 0)]
    pub capacity: u32,

    #[arg(long, default_value_t = 0)]
    pub bedrooms: u32,

    /// Distance to the lake in meters
    #[arg(long = "lake-distance", default_value_t = 0)]
    pub lake_distance: u32,

    /// Nearest city
    #[arg(long)]
    pub city: Option<String>,

    /// Distance to the city in meters
    #[arg(long = "city-distance", default_value_t = 0)]
    pub city_distance: u32,
}

impl From<CottageArgs> for Cottage {
    fn from(args: CottageArgs) -> Self {
        let mut cottage = Cottage::new(args.id)
            .with_capacity(args.capacity)
            .with_bedrooms(args.bedrooms)
            .with_lake_distance(args.lake_distance);
        cottage.address = args.address;
        cottage.image_url = args.image_url;
        cottage.location.city_name = args.city;
        cottage.location.distance_to_city = args.city_distance;
        cottage
    }
}

/// Availability search parameters
#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// Required number of places
    #[arg(long)]
    pub places: u32,

    /// Required number of bedrooms
    #[arg(long)]
    pub bedrooms: u32,

    /// Maximum distance to the lake in meters
    #[arg(long = "max-lake")]
    pub max_lake: u32,

    /// City name, matched case-insensitively
    #[arg(long)]
    pub city: Option<String>,

    /// Maximum distance to the city in meters
    #[arg(long = "max-city")]
    pub max_city: u32,

    /// First day of the stay (DD.MM.YYYY)
    #[arg(long, value_parser = parse_day)]
    pub start: NaiveDate,

    /// Number of nights
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub nights: u32,
}
