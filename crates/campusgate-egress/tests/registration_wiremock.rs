//! Integration tests for the registration portal connector using wiremock

use campusgate_core::CookieSet;
use campusgate_egress::{EgressError, HttpClientConfig, PortalConfig, RegistrationConnector};
use std::time::Duration;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_string, body_string_contains, header, method, path},
};

const LOGIN_FORM: &str = r#"
    <input type="hidden" name="lt" value="LT-7-abc" />
    <input type="hidden" name="execution" value="e2s1" />
"#;

fn portal_config(server: &MockServer) -> PortalConfig {
    PortalConfig::default()
        .with_identity_login_url(format!("{}/cas/login", server.uri()))
        .with_app_base_url(server.uri())
}

async fn mount_cas(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/cas/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Set-Cookie", "CASTGC=TGT-1; Path=/")
                .set_body_string(LOGIN_FORM),
        )
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/cas/login"))
        .and(body_string_contains("execution=e2s1"))
        .respond_with(
            ResponseTemplate::new(302).insert_header(
                "Location",
                format!("{}/my/homeSSO.action?ticket=ST-2", server.uri()),
            ),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/my/homeSSO.action"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Set-Cookie", "MYBK=home; Path=/")
                .set_body_string("<html>home</html>"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_secondary_login_collects_portal_cookies() {
    let server = MockServer::start().await;
    mount_cas(&server).await;

    Mock::given(method("GET"))
        .and(path("/dkmh/"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", format!("{}/dkmh/home.action", server.uri())),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/dkmh/home.action"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Set-Cookie", "JSESSIONID=portal-1; Path=/dkmh")
                .set_body_string("<html>dkmh</html>"),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/dkmh/dangKyMonHocForm.action"))
        .and(header("referer", format!("{}/dkmh/home.action", server.uri())))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>form</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let connector = RegistrationConnector::new(portal_config(&server)).unwrap();
    let login = connector
        .perform_secondary_login("2110123", "secret")
        .await
        .unwrap();

    assert_eq!(login.cookies.get("JSESSIONID"), Some("portal-1"));
    assert_eq!(login.cookies.get("MYBK"), Some("home"));
    assert_eq!(login.cookies.get("CASTGC"), Some("TGT-1"));
}

#[tokio::test]
async fn test_secondary_login_bounced_to_login_page() {
    let server = MockServer::start().await;
    mount_cas(&server).await;

    Mock::given(method("GET"))
        .and(path("/dkmh/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>dkmh</html>"))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/dkmh/home.action"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>dkmh</html>"))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/dkmh/dangKyMonHocForm.action"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", format!("{}/cas/login", server.uri())),
        )
        .mount(&server)
        .await;

    let connector = RegistrationConnector::new(portal_config(&server)).unwrap();
    let err = connector
        .perform_secondary_login("2110123", "secret")
        .await
        .unwrap_err();

    assert!(matches!(err, EgressError::SecondaryLoginRejected));
}

#[tokio::test]
async fn test_session_posts_form_with_stored_cookies() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/dkmh/searchMonHocDangKy.action"))
        .and(header("cookie", "JSESSIONID=portal-1"))
        .and(header(
            "referer",
            format!("{}/dkmh/dangKyMonHocForm.action", server.uri()),
        ))
        .and(header("origin", server.uri()))
        .and(body_string("msmh=CO2003"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<table>hits</table>"))
        .expect(1)
        .mount(&server)
        .await;

    let connector = RegistrationConnector::new(portal_config(&server)).unwrap();
    let session = connector
        .session(&CookieSet::new("JSESSIONID=portal-1"))
        .unwrap();

    let body = session.search_courses("CO2003").await.unwrap();
    assert_eq!(body, "<table>hits</table>");
}

#[tokio::test]
async fn test_session_round_selection_sends_both_ids() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/dkmh/getLichDangKy.action"))
        .and(body_string("dotDKId=901&dotDKHocVienId=5501"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<div>window</div>"))
        .expect(1)
        .mount(&server)
        .await;

    let connector = RegistrationConnector::new(portal_config(&server)).unwrap();
    let session = connector.session(&CookieSet::default()).unwrap();

    let body = session.round_schedule("901", "5501").await.unwrap();
    assert_eq!(body, "<div>window</div>");
}

#[tokio::test]
async fn test_session_picks_up_refreshed_cookies() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/dkmh/ketQuaDangKyView.action"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Set-Cookie", "JSESSIONID=portal-2; Path=/")
                .set_body_string("<div>ok</div>"),
        )
        .mount(&server)
        .await;

    let connector = RegistrationConnector::new(portal_config(&server)).unwrap();
    let session = connector
        .session(&CookieSet::new("JSESSIONID=portal-1; MYBK=home"))
        .unwrap();

    session.open_period("20241").await.unwrap();

    let cookies = session.cookies();
    assert_eq!(cookies.get("JSESSIONID"), Some("portal-2"));
    assert_eq!(cookies.get("MYBK"), Some("home"));
}

#[tokio::test]
async fn test_session_rejected_when_redirected_to_login() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/dkmh/getKetQuaDangKy.action"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", format!("{}/cas/login", server.uri())),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cas/login"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LOGIN_FORM))
        .mount(&server)
        .await;

    let connector = RegistrationConnector::new(portal_config(&server)).unwrap();
    let session = connector
        .session(&CookieSet::new("JSESSIONID=stale"))
        .unwrap();

    let err = session.registration_result().await.unwrap_err();
    assert!(matches!(err, EgressError::SessionRejected));
}

#[tokio::test]
async fn test_session_upstream_error_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/dkmh/xoaKetQuaDangKy.action"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let connector = RegistrationConnector::new(portal_config(&server)).unwrap();
    let session = connector.session(&CookieSet::default()).unwrap();

    let err = session.cancel("7001").await.unwrap_err();
    assert!(matches!(
        err,
        EgressError::UpstreamStatus {
            status_code: 500,
            ..
        }
    ));
}

#[tokio::test]
async fn test_session_call_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/dkmh/getKetQuaDangKy.action"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_secs(3))
                .set_body_string("<div>late</div>"),
        )
        .mount(&server)
        .await;

    let config = portal_config(&server).with_client_config(HttpClientConfig {
        timeout_secs: 1,
        ..HttpClientConfig::default()
    });
    let connector = RegistrationConnector::new(config).unwrap();
    let session = connector
        .session(&CookieSet::new("JSESSIONID=portal-1"))
        .unwrap();

    let err = session.registration_result().await.unwrap_err();
    assert!(matches!(err, EgressError::Timeout(1)));
    assert!(matches!(
        campusgate_core::Error::from(err),
        campusgate_core::Error::UpstreamUnavailable(_)
    ));
}
