use duration_str::deserialize_duration;
use serde::Deserialize;
use std::{collections::HashMap, path::PathBuf, time::Duration};

const DEFAULT_CONFIG_FILE: &str = include_str!("raydb.default.toml");

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub db: Option<Db>,
    pub bot: Option<Bot>,
    pub text: Option<Text>,
    pub tags: Option<HashMap<String, Vec<String>>>,
    pub addr: Option<Addr>,
    pub photos: Option<Photos>,
    pub outbox: Option<Outbox>,
    pub responses: Option<Vec<Response>>,
}

impl Default for Config {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG_FILE).expect("Default configuration")
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Db {
    pub connection_sqlite: String,
    pub connection_pool_size: u8,
    pub index_dir: Option<PathBuf>,
}

impl Default for Db {
    fn default() -> Self {
        Config::default().db.expect("DB configuration")
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Bot {
    pub admin_id: Option<i64>,
    #[serde(default)]
    pub maintenance: bool,
    #[serde(deserialize_with = "deserialize_duration")]
    pub session_timeout: Duration,
    #[serde(deserialize_with = "deserialize_duration")]
    pub location_timeout: Duration,
    #[serde(default)]
    pub utc_offset_hours: i8,
}

impl Default for Bot {
    fn default() -> Self {
        Config::default().bot.expect("Bot configuration")
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Text {
    #[serde(default)]
    pub skip: Vec<String>,
    #[serde(default)]
    pub synonyms: HashMap<String, Vec<String>>,
    pub default_link_title: String,
}

impl Default for Text {
    fn default() -> Self {
        Config::default().text.expect("Text configuration")
    }
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Addr {
    #[serde(default)]
    pub streets: Vec<Street>,
    #[serde(default)]
    pub apartments: HashMap<String, Apartments>,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Street {
    pub name: String,
    pub keywords: Vec<String>,
    #[serde(default)]
    pub buildings: Vec<Building>,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Building {
    pub house: String,
    pub key: String,
}

/// Either the first apartment number or the first number per floor.
#[derive(Deserialize)]
#[serde(untagged)]
pub enum Apartments {
    First(u32),
    Floors(Vec<u32>),
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Response {
    pub name: String,
    pub keywords: Vec<String>,
    pub role: Option<String>,
    pub message: Option<String>,
    pub photo: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Photos {
    pub dir: PathBuf,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Outbox {
    pub dir: PathBuf,
}
