use anyhow::{anyhow, Result};
use raydb_chat::BotConfig;
use raydb_core::{
    entities::{AddressConfig, ApartmentLayout, Building, Role, Street, UserId},
    responses::PredefinedResponse,
    tag::{is_valid_tag, TagKeywords},
    text::{normalize, Tokenizer},
};
use std::{
    env, fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};
use time::{Duration, UtcOffset};

mod raw;

const DEFAULT_CONFIG_FILE_NAME: &str = "raydb.toml";

const ENV_NAME_DB_URL: &str = "DATABASE_URL";

pub struct Config {
    pub db: Db,
    pub bot: Bot,
    pub text: Text,
    pub tags: TagKeywords,
    pub address: AddressConfig,
    pub responses: Vec<PredefinedResponse>,
    /// Directory with `<name>.jpg` files.
    pub photos_dir: Option<PathBuf>,
    /// Outgoing messages are written as JSON files into this
    /// directory instead of the log.
    pub outbox_dir: Option<PathBuf>,
}

impl Config {
    pub fn try_load_from_file_or_default<P: AsRef<Path>>(file_path: Option<P>) -> Result<Self> {
        let file_path: &Path = file_path.as_ref().map(|p| p.as_ref()).unwrap_or_else(|| {
            log::info!("No configuration file specified. load {DEFAULT_CONFIG_FILE_NAME}");
            Path::new(DEFAULT_CONFIG_FILE_NAME)
        });

        let raw_config = match fs::read_to_string(file_path) {
            Ok(cfg_string) => toml::from_str(&cfg_string)?,
            Err(err) => match err.kind() {
                ErrorKind::NotFound => {
                    log::info!(
                        "{} not found => load default configuration.",
                        file_path.display()
                    );
                    Ok(raw::Config::default())
                }
                _ => Err(err),
            }?,
        };
        let mut cfg = Self::try_from(raw_config)?;
        if let Ok(db_url) = env::var(ENV_NAME_DB_URL) {
            cfg.db.conn_sqlite = db_url;
        }
        Ok(cfg)
    }

    pub fn bot_config(&self) -> BotConfig {
        let Bot {
            admin,
            maintenance,
            session_timeout,
            location_timeout,
            utc_offset,
        } = self.bot;
        BotConfig {
            admin,
            maintenance,
            tokenizer: self.text.tokenizer.clone(),
            default_link_title: self.text.default_link_title.clone(),
            tags: self.tags.clone(),
            address: self.address.clone(),
            responses: self.responses.clone(),
            utc_offset,
            session_timeout,
            location_timeout,
            photos_dir: self.photos_dir.clone(),
        }
    }
}

pub struct Db {
    /// SQLite connection
    pub conn_sqlite: String,
    pub conn_pool_size: u8,
    /// File system directory for the full-text search index.
    pub index_dir: Option<PathBuf>,
}

#[derive(Clone, Copy)]
pub struct Bot {
    pub admin: Option<UserId>,
    pub maintenance: bool,
    pub session_timeout: Duration,
    pub location_timeout: Duration,
    pub utc_offset: UtcOffset,
}

pub struct Text {
    pub tokenizer: Tokenizer,
    pub default_link_title: String,
}

impl TryFrom<raw::Config> for Config {
    type Error = anyhow::Error;
    fn try_from(from: raw::Config) -> Result<Self> {
        let raw::Config {
            db,
            bot,
            text,
            tags,
            addr,
            photos,
            outbox,
            responses,
        } = from;

        let raw::Db {
            connection_sqlite,
            connection_pool_size,
            index_dir,
        } = db.unwrap_or_default();
        if connection_pool_size == 0 {
            return Err(anyhow!("The connection pool needs at least one connection"));
        }
        let db = Db {
            conn_sqlite: connection_sqlite,
            conn_pool_size: connection_pool_size,
            index_dir,
        };

        let raw::Bot {
            admin_id,
            maintenance,
            session_timeout,
            location_timeout,
            utc_offset_hours,
        } = bot.unwrap_or_default();
        let bot = Bot {
            admin: admin_id.map(UserId::new),
            maintenance,
            session_timeout: Duration::try_from(session_timeout)?,
            location_timeout: Duration::try_from(location_timeout)?,
            utc_offset: UtcOffset::from_hms(utc_offset_hours, 0, 0)?,
        };
        if maintenance {
            log::warn!("Maintenance mode: only the admin gets answers");
        }

        let raw::Text {
            skip,
            synonyms,
            default_link_title,
        } = text.unwrap_or_default();
        let text = Text {
            tokenizer: Tokenizer::new(skip, synonyms),
            default_link_title,
        };

        let tags = tags.unwrap_or_default();
        // Bare keys like `building` are allowed
        if let Some(invalid) = tags
            .keys()
            .find(|tag| !is_valid_tag(tag) && tag.contains('='))
        {
            return Err(anyhow!("Invalid tag in configuration: {invalid}"));
        }
        let tags = TagKeywords::new(tags);

        let responses = responses
            .unwrap_or_default()
            .into_iter()
            .map(predefined_response)
            .collect::<Result<Vec<_>>>()?;

        let address = address_config(addr.unwrap_or_default());
        log::debug!(
            "Loaded {} tags and {} streets",
            tags.len(),
            address.streets.len()
        );

        Ok(Self {
            db,
            bot,
            text,
            tags,
            address,
            responses,
            photos_dir: photos.map(|p| p.dir),
            outbox_dir: outbox.map(|o| o.dir),
        })
    }
}

fn predefined_response(from: raw::Response) -> Result<PredefinedResponse> {
    let raw::Response {
        name,
        keywords,
        role,
        message,
        photo,
    } = from;
    let role = role
        .map(|role| {
            role.parse::<Role>()
                .map_err(|_| anyhow!("Unknown role {role:?} in response {name:?}"))
        })
        .transpose()?;
    Ok(PredefinedResponse {
        keywords: keywords.iter().map(|k| normalize(k)).collect(),
        name,
        role,
        message,
        photo,
    })
}

fn address_config(from: raw::Addr) -> AddressConfig {
    let raw::Addr {
        streets,
        apartments,
    } = from;
    let streets = streets
        .into_iter()
        .map(|raw::Street { name, keywords, buildings }| Street {
            name,
            keywords: keywords.iter().map(|k| normalize(k)).collect(),
            buildings: buildings
                .into_iter()
                .map(|raw::Building { house, key }| Building {
                    house: normalize(&house),
                    key,
                })
                .collect(),
        })
        .collect();
    let apartments = apartments
        .into_iter()
        .map(|(key, layout)| {
            let layout = match layout {
                raw::Apartments::First(first) => ApartmentLayout::FirstApartment(first),
                raw::Apartments::Floors(floors) => ApartmentLayout::Floors(floors),
            };
            (key, layout)
        })
        .collect();
    AddressConfig {
        streets,
        apartments,
    }
}
