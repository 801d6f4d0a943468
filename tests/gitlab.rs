use indi_census::{
    forge::{
        config::{Host, HostConfig, HostKind},
        traits::PackageSource,
        types::Candidate,
    },
    ignore::IgnoreSet,
    record::ChangelogStatus,
    scanner::{Scanner, process_candidate},
};
use secrecy::SecretString;
use std::sync::Arc;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GROUP_ID: u64 = 2052;

fn ok_json(body: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(body)
}

fn ok_text(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_string(body)
}

async fn gitlab_source(server: &MockServer) -> Arc<dyn PackageSource> {
    let api_url = format!("{}/api/v4", server.uri());
    let config = HostConfig::new(HostKind::Gitlab, &api_url)
        .unwrap()
        .with_token(Some(SecretString::from("gl-test-token".to_string())));

    Host::Gitlab(config).get_source().unwrap()
}

async fn mount_group(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/v4/groups/debian-astro-team"))
        .and(header("private-token", "gl-test-token"))
        .respond_with(ok_json(serde_json::json!({
            "id": GROUP_ID,
            "name": "Debian Astro Team"
        })))
        .mount(server)
        .await;
}

async fn mount_project(server: &MockServer, id: u64, default_branch: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/api/v4/projects/{id}")))
        .respond_with(ok_json(serde_json::json!({
            "id": id,
            "name": "indi-eqmod",
            "default_branch": default_branch
        })))
        .mount(server)
        .await;
}

fn file_path(id: u64, encoded: &str) -> String {
    format!("/api/v4/projects/{id}/repository/files/{encoded}/raw")
}

#[test_log::test(tokio::test)]
async fn lists_indi_projects_of_the_group() {
    let server = MockServer::start().await;
    mount_group(&server).await;

    Mock::given(method("GET"))
        .and(path(format!("/api/v4/groups/{GROUP_ID}/projects")))
        .and(query_param("per_page", "100"))
        .and(query_param("order_by", "name"))
        .respond_with(ok_json(serde_json::json!([
            { "id": 11, "name": "indi-ahp-xc" },
            { "id": 12, "name": "indi-eqmod" },
            { "id": 13, "name": "kstars" },
            { "id": 14, "name": "libasi" },
            { "id": 15, "name": "indi-asu" },
        ])))
        .mount(&server)
        .await;

    let source = gitlab_source(&server).await;
    let candidates = source.list_candidates().await.unwrap();

    assert_eq!(
        candidates,
        vec![Candidate::new("indi-eqmod", "12"), Candidate::new("libasi", "14")]
    );
}

#[tokio::test]
async fn unknown_group_fails_the_listing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v4/groups/debian-astro-team"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let scanner =
        Scanner::new(gitlab_source(&server).await, IgnoreSet::default(), 8);

    assert!(scanner.scan().await.is_err());
}

#[tokio::test]
async fn falls_back_to_next_location_and_stops_at_first_hit() {
    let server = MockServer::start().await;
    mount_project(&server, 12, "main").await;

    // debian/main: debian/changelog is missing
    Mock::given(method("GET"))
        .and(path(file_path(12, "debian%2Fchangelog")))
        .and(query_param("ref", "debian/main"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    // debian/main: packaging/debian/changelog exists
    Mock::given(method("GET"))
        .and(path(file_path(12, "packaging%2Fdebian%2Fchangelog")))
        .and(query_param("ref", "debian/main"))
        .respond_with(ok_text(
            "indi-eqmod (1.3.9-2) unstable; urgency=medium\n\n  * Rebuild.\n",
        ))
        .expect(1)
        .mount(&server)
        .await;

    // nothing later in the chain is requested
    Mock::given(method("GET"))
        .and(path(file_path(12, "debian.upstream%2Fchangelog")))
        .respond_with(ok_text("indi-eqmod (0.1-1) sid"))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(file_path(12, "debian%2Fchangelog")))
        .and(query_param("ref", "main"))
        .respond_with(ok_text("indi-eqmod (0.1-1) sid"))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v4/projects/12/repository/commits"))
        .and(query_param("ref_name", "debian/main"))
        .and(query_param("per_page", "1"))
        .respond_with(ok_json(serde_json::json!([{
            "id": "9d8c7b6a5f4e3d2c1b0a9d8c7b6a5f4e3d2c1b0a",
            "committed_date": "2024-03-10T09:15:00.000+01:00"
        }])))
        .expect(1)
        .mount(&server)
        .await;

    let source = gitlab_source(&server).await;
    let candidate = Candidate::new("indi-eqmod", "12");
    let record = process_candidate(source.as_ref(), &candidate).await;

    assert_eq!(record.version, "1.3.9-2");
    assert_eq!(record.changelog_branch.as_deref(), Some("debian/main"));
    assert_eq!(
        record.changelog_path.as_deref(),
        Some("packaging/debian/changelog")
    );
    assert_eq!(record.short_hash(), Some("9d8c7b6a"));
    assert_eq!(record.snapshot().as_deref(), Some("git20240310.9d8c7b6a"));
}

#[tokio::test]
async fn default_branch_is_searched_after_packaging_branch() {
    let server = MockServer::start().await;
    mount_project(&server, 14, "upstream").await;

    Mock::given(method("GET"))
        .and(path(file_path(14, "debian%2Fchangelog")))
        .and(query_param("ref", "upstream"))
        .respond_with(ok_text("libasi (1.36-1) unstable; urgency=low"))
        .expect(1)
        .mount(&server)
        .await;

    // everything on debian/main is missing
    Mock::given(method("GET"))
        .and(query_param("ref", "debian/main"))
        .respond_with(ResponseTemplate::new(404))
        .expect(4)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v4/projects/14/repository/commits"))
        .respond_with(ok_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let source = gitlab_source(&server).await;
    let candidate = Candidate::new("libasi", "14");
    let record = process_candidate(source.as_ref(), &candidate).await;

    assert_eq!(record.version, "1.36-1");
    assert_eq!(record.changelog_branch.as_deref(), Some("upstream"));
    assert!(record.commit_hash.is_none());
}

#[tokio::test]
async fn unresolvable_default_branch_falls_back_to_master() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v4/projects/15"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let source = gitlab_source(&server).await;
    let locations = source
        .changelog_locations(&Candidate::new("libfli", "15"))
        .await;

    let branches = locations
        .iter()
        .filter_map(|l| l.branch.as_deref())
        .collect::<Vec<_>>();

    assert_eq!(locations.len(), 8);
    assert_eq!(&branches[..4], ["debian/main"; 4]);
    assert_eq!(&branches[4..], ["master"; 4]);
    assert_eq!(locations[4].path, "debian/changelog");
}

#[tokio::test]
async fn no_changelog_anywhere_yields_unknown() {
    let server = MockServer::start().await;
    mount_project(&server, 16, "master").await;

    Mock::given(method("GET"))
        .and(path("/api/v4/projects/16/repository/commits"))
        .respond_with(ok_json(serde_json::json!([])))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(8)
        .mount(&server)
        .await;

    let source = gitlab_source(&server).await;
    let candidate = Candidate::new("libmissing", "16");
    let record = process_candidate(source.as_ref(), &candidate).await;

    assert_eq!(record.version, "Unknown");
    assert_eq!(record.changelog, ChangelogStatus::NotFound);
    assert!(record.commit_hash.is_none());
    assert!(record.commit_date.is_none());
}
