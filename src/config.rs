use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::quiz::grade::GradeTable;

/// Runtime settings read from the environment (and `.env`).
#[derive(Clone)]
pub struct Config {
    pub token: String,
    pub main_admin: i64,
    pub admins: Vec<i64>,
    /// JSON snapshot for the store; `None` keeps everything in memory.
    pub data_path: Option<PathBuf>,
    /// Sqlite file backing the authoring dialogues.
    pub dialogue_db: String,
    pub form_addr: SocketAddr,
    /// Public address of the closed-form page shown to respondents.
    pub form_url: Option<String>,
    pub send_delay: Duration,
    pub grades: GradeTable,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("token", &"***")
            .field("main_admin", &self.main_admin)
            .field("admins", &self.admins)
            .field("data_path", &self.data_path)
            .field("dialogue_db", &self.dialogue_db)
            .field("form_addr", &self.form_addr)
            .field("form_url", &self.form_url)
            .field("send_delay", &self.send_delay)
            .finish()
    }
}

fn parse_id(name: &'static str, value: &str) -> Result<i64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        value: value.to_string(),
    })
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let token = lookup("TELOXIDE_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::Missing("TELOXIDE_TOKEN"))?;

        let main_admin = match lookup("MAIN_ADMIN_ID") {
            Some(v) => parse_id("MAIN_ADMIN_ID", &v)?,
            None => 0,
        };
        let admins = lookup("ADMINS")
            .unwrap_or_default()
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(|s| parse_id("ADMINS", s))
            .collect::<Result<Vec<_>, _>>()?;

        let form_addr = match lookup("FORM_ADDR") {
            Some(v) => v.parse().map_err(|_| ConfigError::Invalid {
                name: "FORM_ADDR",
                value: v.clone(),
            })?,
            None => SocketAddr::from(([127, 0, 0, 1], 8080)),
        };
        let send_delay = match lookup("SEND_DELAY_MS") {
            Some(v) => Duration::from_millis(v.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "SEND_DELAY_MS",
                value: v.clone(),
            })?),
            None => Duration::from_millis(120),
        };
        let grades = match lookup("GRADE_BANDS") {
            Some(v) => v.parse()?,
            None => GradeTable::default(),
        };

        Ok(Self {
            token,
            main_admin,
            admins,
            data_path: lookup("QUIZ_DATA_PATH").map(PathBuf::from),
            dialogue_db: lookup("DIALOGUE_DB").unwrap_or_else(|| "dialogues.sqlite".to_string()),
            form_addr,
            form_url: lookup("FORM_URL").filter(|u| !u.trim().is_empty()),
            send_delay,
            grades,
        })
    }

    pub fn is_admin(&self, id: i64) -> bool {
        self.is_main_admin(id) || self.admins.contains(&id)
    }

    pub fn is_main_admin(&self, id: i64) -> bool {
        id != 0 && id == self.main_admin
    }

    /// Form link for one respondent, when a form URL is configured.
    pub fn form_link(&self, respondent: i64) -> Option<String> {
        self.form_url.as_ref().map(|url| {
            let separator = if url.contains('?') { '&' } else { '?' };
            format!("{url}{separator}respondent={respondent}")
        })
    }
}
