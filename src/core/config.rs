use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

/// Database file path
/// Read from DATABASE_PATH environment variable
/// Default: database.sqlite
pub static DATABASE_PATH: Lazy<String> =
    Lazy::new(|| env::var("DATABASE_PATH").unwrap_or_else(|_| "database.sqlite".to_string()));

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: app.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "app.log".to_string()));

/// Bot token
/// Read from BOT_TOKEN or TELOXIDE_TOKEN environment variable
pub static BOT_TOKEN: Lazy<String> = Lazy::new(|| {
    env::var("BOT_TOKEN")
        .or_else(|_| env::var("TELOXIDE_TOKEN"))
        .unwrap_or_else(|_| String::new())
});

/// Webhook URL for Telegram updates
/// Read from WEBHOOK_URL environment variable
pub static WEBHOOK_URL: Lazy<Option<String>> = Lazy::new(|| env::var("WEBHOOK_URL").ok());

/// Channels the user must join before opening a support ticket
/// Comma-separated usernames in REQUIRED_CHANNELS (e.g. "@maryam_mebel");
/// empty disables the gate
pub static REQUIRED_CHANNELS: Lazy<Vec<String>> = Lazy::new(|| {
    env::var("REQUIRED_CHANNELS")
        .unwrap_or_else(|_| String::new())
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
});

/// Public website URL shown to customers in the order prompt
/// Read from SITE_URL environment variable
pub static SITE_URL: Lazy<String> =
    Lazy::new(|| env::var("SITE_URL").unwrap_or_else(|_| "https://maryam-mebel.uz".to_string()));

/// Path to the product catalog JSON file
/// Read from PRODUCTS_FILE environment variable
pub static PRODUCTS_FILE: Lazy<String> =
    Lazy::new(|| env::var("PRODUCTS_FILE").unwrap_or_else(|_| "data/products.json".to_string()));

/// Path to the contact-form message log JSON file
/// Read from MESSAGES_FILE environment variable
pub static MESSAGES_FILE: Lazy<String> =
    Lazy::new(|| env::var("MESSAGES_FILE").unwrap_or_else(|_| "data/messages.json".to_string()));

/// Directory with uploaded product images, served under /static/uploads
pub static UPLOADS_DIR: Lazy<String> =
    Lazy::new(|| env::var("UPLOADS_DIR").unwrap_or_else(|_| "static/uploads".to_string()));

/// Administration configuration
pub mod admin {
    use super::{env, Lazy};

    /// Telegram ids of support operators, comma-separated in ADMIN_IDS
    pub static ADMIN_IDS: Lazy<Vec<i64>> = Lazy::new(|| {
        env::var("ADMIN_IDS")
            .unwrap_or_else(|_| String::new())
            .split(',')
            .filter_map(|s| s.trim().parse::<i64>().ok())
            .collect()
    });

    /// Chat id that receives vacancy applications
    /// Falls back to the first admin id when EMPLOYER_CHAT_ID is not set
    pub static EMPLOYER_CHAT_ID: Lazy<Option<i64>> = Lazy::new(|| {
        env::var("EMPLOYER_CHAT_ID")
            .ok()
            .and_then(|s| s.trim().parse::<i64>().ok())
            .or_else(|| ADMIN_IDS.first().copied())
    });

    /// Web admin panel login
    pub static WEB_ADMIN_USER: Lazy<String> =
        Lazy::new(|| env::var("WEB_ADMIN_USER").unwrap_or_else(|_| "admin".to_string()));

    /// Web admin panel password; empty disables the panel
    pub static WEB_ADMIN_PASSWORD: Lazy<String> =
        Lazy::new(|| env::var("WEB_ADMIN_PASSWORD").unwrap_or_else(|_| String::new()));

    /// Open tickets shown per page in the bot admin panel
    pub const PANEL_PAGE_SIZE: i64 = 5;

    /// Per-topic operator routing, TOPIC_ADMINS="texnik:111|222,buyurtma:333".
    /// Topics without an entry fan out to ADMIN_IDS
    pub static TOPIC_ADMINS: Lazy<Vec<(String, Vec<i64>)>> =
        Lazy::new(|| parse_topic_admins(&env::var("TOPIC_ADMINS").unwrap_or_default()));

    pub fn parse_topic_admins(raw: &str) -> Vec<(String, Vec<i64>)> {
        raw.split(',')
            .filter_map(|entry| {
                let (topic, ids) = entry.split_once(':')?;
                let topic = topic.trim();
                if topic.is_empty() {
                    return None;
                }
                let ids: Vec<i64> = ids.split('|').filter_map(|s| s.trim().parse().ok()).collect();
                (!ids.is_empty()).then(|| (topic.to_string(), ids))
            })
            .collect()
    }

    /// Operators a new ticket on `topic` is announced to.
    pub fn admins_for_topic(topic: &str) -> Vec<i64> {
        TOPIC_ADMINS
            .iter()
            .find(|(t, _)| t == topic)
            .map(|(_, ids)| ids.clone())
            .unwrap_or_else(|| ADMIN_IDS.clone())
    }
}

/// Web server configuration
pub mod web {
    use super::{env, Lazy};

    /// Port the public website listens on
    /// Read from WEB_PORT environment variable, default 3000
    pub static WEB_PORT: Lazy<u16> = Lazy::new(|| {
        env::var("WEB_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000)
    });

    /// Port the Telegram webhook listener binds to in webhook mode
    /// Read from WEBHOOK_PORT environment variable, default 8443
    pub static WEBHOOK_PORT: Lazy<u16> = Lazy::new(|| {
        env::var("WEBHOOK_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(8443)
    });
}

/// Network configuration
pub mod network {
    use super::Duration;

    /// Request timeout for outbound Telegram API calls (in seconds)
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;

    /// Request timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    #[test]
    fn panel_page_size_is_positive() {
        assert!(super::admin::PANEL_PAGE_SIZE > 0);
    }

    #[test]
    fn topic_admins_parse_pipe_separated_ids() {
        let parsed = super::admin::parse_topic_admins("texnik:111|222, buyurtma:333");
        assert_eq!(
            parsed,
            vec![
                ("texnik".to_string(), vec![111, 222]),
                ("buyurtma".to_string(), vec![333]),
            ]
        );
    }

    #[test]
    fn topic_admins_skip_malformed_entries() {
        assert!(super::admin::parse_topic_admins("").is_empty());
        assert!(super::admin::parse_topic_admins("texnik").is_empty());
        assert!(super::admin::parse_topic_admins(":111").is_empty());
        assert!(super::admin::parse_topic_admins("texnik:abc").is_empty());
    }

    #[test]
    fn network_timeout_matches_const() {
        assert_eq!(
            super::network::timeout().as_secs(),
            super::network::REQUEST_TIMEOUT_SECS
        );
    }
}
