//! Action flows through the dispatcher against a mock API.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{TimeZone, Utc};
use gigboard::api::{ApiClient, RecordingRedirect};
use gigboard::app::confirm::ScriptedConfirm;
use gigboard::app::toast::ToastKind;
use gigboard::app::{Dispatcher, Outcome};
use gigboard::model::{ProjectStatus, ServerConfig, UiConfig};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Harness {
    server: MockServer,
    redirect: Arc<RecordingRedirect>,
    d: Dispatcher<ScriptedConfirm>,
}

async fn harness(answers: &[bool]) -> Harness {
    let server = MockServer::start().await;
    let redirect = Arc::new(RecordingRedirect::new());
    let config = ServerConfig {
        base_url: format!("{}/api", server.uri()),
        timeout_secs: 5,
    };
    let api = ApiClient::new(&config, redirect.clone()).unwrap();
    let d = Dispatcher::new(
        api,
        ScriptedConfirm::new(answers.iter().copied()),
        UiConfig::default(),
    );
    Harness {
        server,
        redirect,
        d,
    }
}

fn acme_clients() -> Value {
    json!([{"id": "c1", "name": "Acme"}])
}

fn acme_projects() -> Value {
    json!([
        {"id": "1", "client_id": "c1", "title": "A", "status": "idea"},
        {"id": "2", "client_id": "c1", "title": "B", "status": "completed"}
    ])
}

async fn mount_lists(server: &MockServer, clients: Value, projects: Value) {
    Mock::given(method("GET"))
        .and(path("/api/clients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(clients))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(projects))
        .mount(server)
        .await;
}

fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 10, 12, 0, 0).unwrap()
}

#[tokio::test]
async fn load_builds_board_with_client_names() {
    let mut h = harness(&[]).await;
    mount_lists(&h.server, acme_clients(), acme_projects()).await;

    assert_eq!(h.d.load().await, Outcome::Done);
    assert!(!h.d.board_loading());

    let board = h.d.board(now(), &Utc);
    let idea = board.column(ProjectStatus::Idea).unwrap();
    let done = board.column(ProjectStatus::Completed).unwrap();
    assert_eq!(idea.cards.len(), 1);
    assert_eq!(done.cards.len(), 1);
    assert_eq!(idea.cards[0].client_name, "Acme");
    assert_eq!(done.cards[0].client_name, "Acme");
    for status in [
        ProjectStatus::Talks,
        ProjectStatus::InProgress,
        ProjectStatus::Review,
    ] {
        assert!(board.column(status).unwrap().is_empty());
    }

    let html = h.d.board_html(now(), &Utc);
    assert_eq!(html.matches("<p class=\"client\">Acme</p>").count(), 2);
    assert_eq!(html.matches("No projects").count(), 3);
    assert!(html.contains("<div class=\"board\">"));
}

#[tokio::test]
async fn expired_session_on_delete_redirects_without_refetch() {
    let mut h = harness(&[true]).await;
    mount_lists(&h.server, acme_clients(), acme_projects()).await;
    h.d.load().await;
    let clients_before = h.d.cache().clients().to_vec();
    let projects_before = h.d.cache().projects().to_vec();

    h.server.reset().await;
    Mock::given(method("DELETE"))
        .and(path("/api/projects/1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&h.server)
        .await;

    assert_eq!(h.d.delete_project("1").await, Outcome::SessionExpired);
    assert_eq!(h.redirect.count(), 1);
    assert_eq!(h.d.cache().clients(), clients_before.as_slice());
    assert_eq!(h.d.cache().projects(), projects_before.as_slice());
    assert!(h.d.toasts().is_empty());
}

#[tokio::test]
async fn declined_confirmation_sends_nothing() {
    let mut h = harness(&[false]).await;
    Mock::given(method("DELETE"))
        .and(path("/api/clients/c1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&h.server)
        .await;

    assert_eq!(h.d.delete_client("c1").await, Outcome::Cancelled);
    assert!(h.d.toasts().is_empty());
}

#[tokio::test]
async fn confirmed_delete_refetches_and_notifies() {
    let mut h = harness(&[true]).await;
    Mock::given(method("DELETE"))
        .and(path("/api/clients/c1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/clients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&h.server)
        .await;

    assert_eq!(h.d.delete_client("c1").await, Outcome::Done);
    assert!(h.d.cache().clients().is_empty());
    let toast = h.d.toasts().last().cloned().unwrap();
    assert_eq!(toast.kind, ToastKind::Success);
    assert_eq!(toast.message, "Client deleted");
}

#[tokio::test]
async fn saving_a_client_closes_the_form_and_refreshes() {
    let mut h = harness(&[]).await;
    Mock::given(method("POST"))
        .and(path("/api/clients"))
        .and(body_json(json!({
            "name": "Globex",
            "email": null,
            "phone": "555-0100",
            "company": null,
            "notes": null
        })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"id": "c2", "name": "Globex"})),
        )
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/clients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "c1", "name": "Acme"},
            {"id": "c2", "name": "Globex", "phone": "555-0100"}
        ])))
        .expect(1)
        .mount(&h.server)
        .await;

    h.d.client_form.open_create();
    h.d.client_form.fields.name = " Globex ".into();
    h.d.client_form.fields.phone = "555-0100".into();

    assert_eq!(h.d.submit_client_form().await, Outcome::Done);
    assert!(!h.d.client_form.is_open());
    assert_eq!(h.d.cache().clients().len(), 2);
    assert_eq!(h.d.toasts().last().unwrap().message, "Client created");
}

#[tokio::test]
async fn invalid_form_is_reported_without_a_request() {
    let mut h = harness(&[]).await;
    Mock::given(method("POST"))
        .and(path("/api/projects"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&h.server)
        .await;

    h.d.project_form.open_create();
    h.d.project_form.fields.client_id = "c1".into();
    h.d.project_form.fields.title = "Site".into();
    h.d.project_form.fields.hourly_rate = "lots".into();

    assert_eq!(h.d.submit_project_form(&Utc).await, Outcome::Failed);
    assert!(h.d.project_form.is_open());
    let toast = h.d.toasts().last().cloned().unwrap();
    assert_eq!(toast.kind, ToastKind::Error);
    assert!(toast.message.contains("lots"));
}

#[tokio::test]
async fn server_validation_error_keeps_the_form_open() {
    let mut h = harness(&[]).await;
    Mock::given(method("POST"))
        .and(path("/api/projects"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "detail": [{"loc": ["body", "client_id"], "msg": "Client not found"}]
        })))
        .mount(&h.server)
        .await;

    h.d.project_form.open_create();
    h.d.project_form.fields.client_id = "gone".into();
    h.d.project_form.fields.title = "Site".into();

    assert_eq!(h.d.submit_project_form(&Utc).await, Outcome::Failed);
    assert!(h.d.project_form.is_open());
    assert_eq!(
        h.d.toasts().last().unwrap().message,
        "body.client_id: Client not found"
    );
}

#[tokio::test]
async fn status_change_moves_the_card() {
    let mut h = harness(&[]).await;
    mount_lists(&h.server, acme_clients(), acme_projects()).await;
    h.d.load().await;

    h.server.reset().await;
    Mock::given(method("PATCH"))
        .and(path("/api/projects/1/status"))
        .and(body_json(json!({"status": "review"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(
            {"id": "1", "client_id": "c1", "title": "A", "status": "review"}
        )))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "1", "client_id": "c1", "title": "A", "status": "review"},
            {"id": "2", "client_id": "c1", "title": "B", "status": "completed"}
        ])))
        .mount(&h.server)
        .await;

    assert_eq!(
        h.d.change_project_status("1", ProjectStatus::Review).await,
        Outcome::Done
    );
    let board = h.d.board(now(), &Utc);
    assert!(board.column(ProjectStatus::Idea).unwrap().is_empty());
    assert_eq!(board.column(ProjectStatus::Review).unwrap().cards[0].id, "1");
    assert_eq!(h.d.toasts().last().unwrap().message, "Moved to Review");
}

#[tokio::test]
async fn failed_refresh_keeps_stale_data_with_retry() {
    let mut h = harness(&[]).await;
    mount_lists(&h.server, acme_clients(), acme_projects()).await;
    h.d.load().await;

    h.server.reset().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&h.server)
        .await;

    assert_eq!(h.d.refresh_projects().await, Outcome::Failed);
    assert_eq!(h.d.refresh_clients().await, Outcome::Failed);
    assert!(h.d.projects_failed());
    assert!(h.d.clients_failed());
    assert!(!h.d.board_loading());
    assert_eq!(h.d.cache().projects().len(), 2);
    assert_eq!(h.d.cache().clients().len(), 1);

    let board = h.d.board_html(now(), &Utc);
    assert!(board.contains("Failed to load projects. Please try again."));
    assert!(board.contains("data-action=\"retry-projects\""));
    assert!(board.contains("<h4>A</h4>"));

    let table = h.d.client_table_html();
    assert!(table.contains("data-action=\"retry-clients\""));
    assert!(table.contains("<td class=\"name\">Acme</td>"));
}

#[tokio::test]
async fn board_shows_loading_while_projects_are_in_flight() {
    let mut h = harness(&[]).await;
    Mock::given(method("GET"))
        .and(path("/api/projects"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(acme_projects())
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&h.server)
        .await;

    assert!(!h.d.board_loading());
    let fetch = h.d.begin_projects_fetch();
    let in_flight = tokio::spawn(fetch.send());

    assert!(h.d.board_loading());
    assert!(
        h.d.board_html(now(), &Utc)
            .contains("<div class=\"board loading\">")
    );

    let fetched = in_flight.await.unwrap();
    assert!(h.d.board_loading());
    assert_eq!(h.d.finish_projects_fetch(fetched), Outcome::Done);
    assert!(!h.d.board_loading());
    assert_eq!(h.d.cache().projects().len(), 2);
    assert!(h.d.board_html(now(), &Utc).contains("<div class=\"board\">"));
}

#[tokio::test]
async fn out_of_order_project_list_is_discarded() {
    let mut h = harness(&[]).await;
    Mock::given(method("GET"))
        .and(path("/api/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "old", "client_id": "c1", "title": "Old", "status": "idea"}
        ])))
        .up_to_n_times(1)
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(acme_projects()))
        .mount(&h.server)
        .await;

    let older = h.d.begin_projects_fetch();
    let newer = h.d.begin_projects_fetch();
    let older = older.send().await;
    let newer = newer.send().await;

    assert_eq!(h.d.finish_projects_fetch(newer), Outcome::Done);
    assert!(!h.d.board_loading());
    assert_eq!(h.d.finish_projects_fetch(older), Outcome::Done);

    let ids: Vec<_> = h.d.cache().projects().iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2"]);
    assert!(!h.d.board_loading());
}

#[tokio::test]
async fn stale_project_response_keeps_the_overlay_for_the_newer_fetch() {
    let mut h = harness(&[]).await;
    mount_lists(&h.server, acme_clients(), acme_projects()).await;

    let older = h.d.begin_projects_fetch();
    let newer = h.d.begin_projects_fetch();
    let older = older.send().await;
    h.d.finish_projects_fetch(older);

    assert!(h.d.board_loading());
    assert!(h.d.cache().projects().is_empty());

    let newer = newer.send().await;
    h.d.finish_projects_fetch(newer);
    assert!(!h.d.board_loading());
    assert_eq!(h.d.cache().projects().len(), 2);
}

#[tokio::test]
async fn settled_client_search_reports_an_expired_session() {
    let mut h = harness(&[]).await;
    Mock::given(method("GET"))
        .and(path("/api/clients"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&h.server)
        .await;

    let t0 = Instant::now();
    h.d.on_client_search_input("acme", t0);
    assert_eq!(
        h.d.tick(t0 + Duration::from_millis(300)).await,
        Some(Outcome::SessionExpired)
    );
    assert_eq!(h.redirect.count(), 1);
    assert!(!h.d.clients_failed());
}

#[tokio::test]
async fn client_search_is_debounced() {
    let mut h = harness(&[]).await;
    Mock::given(method("GET"))
        .and(path("/api/clients"))
        .and(query_param("search", "acme"))
        .respond_with(ResponseTemplate::new(200).set_body_json(acme_clients()))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/clients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&h.server)
        .await;

    let t0 = Instant::now();
    h.d.on_client_search_input("a", t0);
    h.d.on_client_search_input("ac", t0 + Duration::from_millis(100));
    h.d.on_client_search_input("acme", t0 + Duration::from_millis(200));

    assert_eq!(h.d.tick(t0 + Duration::from_millis(300)).await, None);
    assert_eq!(h.d.next_deadline(), Some(t0 + Duration::from_millis(500)));
    assert_eq!(
        h.d.tick(t0 + Duration::from_millis(500)).await,
        Some(Outcome::Done)
    );
    assert_eq!(h.d.client_search(), "acme");
    assert_eq!(h.d.cache().clients().len(), 1);
    assert_eq!(h.d.tick(t0 + Duration::from_millis(900)).await, None);
}

#[tokio::test]
async fn board_search_filters_locally() {
    let mut h = harness(&[]).await;
    mount_lists(&h.server, acme_clients(), acme_projects()).await;
    h.d.load().await;

    let t0 = Instant::now();
    h.d.on_board_search_input("  b ", t0);
    assert_eq!(
        h.d.tick(t0 + Duration::from_millis(300)).await,
        Some(Outcome::Done)
    );
    assert_eq!(h.d.filter().search, "b");

    let board = h.d.board(now(), &Utc);
    assert_eq!(board.stats.total, 1);
    assert!(board.column(ProjectStatus::Idea).unwrap().is_empty());
}

#[tokio::test]
async fn last_status_chip_cannot_be_cleared() {
    let mut h = harness(&[]).await;
    for status in [
        ProjectStatus::Idea,
        ProjectStatus::Talks,
        ProjectStatus::InProgress,
        ProjectStatus::Review,
    ] {
        assert!(h.d.toggle_status(status));
    }
    assert!(!h.d.toggle_status(ProjectStatus::Completed));
    assert!(h.d.filter().has_status(ProjectStatus::Completed));
    assert_eq!(h.d.filter().statuses().len(), 1);
}

#[tokio::test]
async fn rejected_login_surfaces_the_server_message() {
    let mut h = harness(&[]).await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"detail": "Invalid credentials"})),
        )
        .mount(&h.server)
        .await;

    assert_eq!(
        h.d.login("me@example.com", "nope").await.unwrap_err(),
        Outcome::Failed
    );
    assert!(!h.redirect.redirected());
    assert_eq!(h.d.toasts().last().unwrap().message, "Invalid credentials");
}
