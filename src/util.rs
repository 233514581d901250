const SMTP_USERNAME: &str = "SMTP_USERNAME";

pub fn get_smtp_username() -> Option<String> {
    std::env::var(SMTP_USERNAME).ok()
}

const SMTP_PASSWORD: &str = "SMTP_PASSWORD";

pub fn get_smtp_password() -> Option<String> {
    std::env::var(SMTP_PASSWORD).ok()
}

const API_TOKEN: &str = "CAREWATCH_API_TOKEN";

pub fn get_api_token() -> Option<String> {
    std::env::var(API_TOKEN).ok().filter(|token| !token.is_empty())
}

const CONFIG_PATH: &str = "CAREWATCH_CONFIG";

const DEFAULT_CONFIG_PATH: &str = "./carewatch.json";

pub fn get_config_path() -> String {
    std::env::var(CONFIG_PATH).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
}
