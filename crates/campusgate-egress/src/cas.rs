//! CAS login handshake shared by both portals
//!
//! 1. GET the login page for a service and scrape the `execution` and `lt`
//!    anti-forgery values.
//! 2. POST the credentials with those values, following redirects back to the
//!    service.
//! 3. Ending up on the login page again means the credentials were refused.

use crate::client::{ensure_success, send};
use crate::config::PortalConfig;
use crate::{EgressError, Result};
use campusgate_core::masking::{mask_sensitive, mask_url};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, Response, Url};
use tracing::debug;

static EXECUTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"name="execution"\s+value="([^"]+)""#).unwrap());
static LOGIN_TICKET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"name="lt"\s+value="([^"]+)""#).unwrap());

/// Anti-forgery values of the CAS login form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginForm {
    pub execution: String,
    pub lt: String,
}

/// Scrape the anti-forgery values from the login page
pub fn parse_login_form(html: &str) -> Result<LoginForm> {
    let execution = EXECUTION.captures(html).map(|caps| caps[1].to_string());
    let lt = LOGIN_TICKET.captures(html).map(|caps| caps[1].to_string());

    match (execution, lt) {
        (Some(execution), Some(lt)) => Ok(LoginForm { execution, lt }),
        _ => Err(EgressError::UnexpectedMarkup(format!(
            "login form without execution/lt fields ({} bytes)",
            html.len()
        ))),
    }
}

/// Run the handshake for `service` and return the final response
pub(crate) async fn submit_credentials(
    client: &Client,
    config: &PortalConfig,
    service: &Url,
    username: &str,
    password: &str,
) -> Result<Response> {
    let login_url = config.login_url_for(service)?;

    let page = ensure_success(send(client.get(login_url.clone()), &config.client_config).await?)?;
    let form = parse_login_form(&page.text().await?)?;
    debug!("Got login form, execution: {}", mask_sensitive(&form.execution, 8));

    let params = [
        ("username", username),
        ("password", password),
        ("execution", form.execution.as_str()),
        ("_eventId", "submit"),
        ("lt", form.lt.as_str()),
        ("submit", "Login"),
    ];
    let response = send(client.post(login_url).form(&params), &config.client_config).await?;
    debug!("Final URL after login: {}", mask_url(response.url().as_str()));

    // CAS answers refused credentials with the login page itself, sometimes as 401
    if config.is_login_page(response.url()) {
        return Err(EgressError::InvalidCredentials);
    }

    ensure_success(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_login_form() {
        let html = r#"
            <input type="hidden" name="lt" value="LT-1-abc" />
            <input type="hidden" name="execution" value="e1s1" />
        "#;
        let form = parse_login_form(html).unwrap();
        assert_eq!(form.execution, "e1s1");
        assert_eq!(form.lt, "LT-1-abc");
    }

    #[test]
    fn test_missing_field_is_unexpected_markup() {
        let html = r#"<input type="hidden" name="execution" value="e1s1" />"#;
        assert!(matches!(
            parse_login_form(html),
            Err(EgressError::UnexpectedMarkup(_))
        ));
        assert!(parse_login_form("").is_err());
    }
}
