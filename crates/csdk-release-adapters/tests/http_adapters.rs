//! GitHub and Jenkins adapters against a local mock HTTP server.

use std::path::Path;
use std::time::Duration;

use csdk_release_adapters::github::COMBINED_STATUS_JOB;
use csdk_release_adapters::{GithubClient, GithubConfig, JenkinsClient, JenkinsConfig, Secret};
use csdk_release_core::{
    CiProvider, CommitId, JobRef, JobStatus, ProviderError, RepoLocation, VersionControlProvider,
};
use serde_json::json;
use wiremock::matchers::{basic_auth, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "gh-token-1";

fn github(server: &MockServer) -> GithubClient {
    GithubClient::new(GithubConfig::new(Secret::new(TOKEN)).with_api_url(server.uri()))
        .expect("github client")
}

fn jenkins(server: &MockServer) -> JenkinsClient {
    JenkinsClient::new(JenkinsConfig::new(server.uri(), "release", Secret::new("jenkins-pw")))
        .expect("jenkins client")
}

fn coremqtt() -> RepoLocation {
    RepoLocation::new("FreeRTOS/coreMQTT")
}

#[tokio::test]
async fn branch_listing_follows_pages() {
    let server = MockServer::start().await;
    let first: Vec<_> = (0..100).map(|i| json!({ "name": format!("feature-{i:03}") })).collect();
    Mock::given(method("GET"))
        .and(path("/repos/FreeRTOS/coreMQTT/branches"))
        .and(query_param("per_page", "100"))
        .and(query_param("page", "1"))
        .and(header("Authorization", "token gh-token-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(first)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/FreeRTOS/coreMQTT/branches"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "name": "main" }])))
        .expect(1)
        .mount(&server)
        .await;

    let branches = github(&server).list_branches(&coremqtt()).await.expect("branches");

    assert_eq!(branches.len(), 101);
    assert!(branches.contains("main"));
    assert!(branches.contains("feature-099"));
}

#[tokio::test]
async fn head_commit_of_branch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/FreeRTOS/coreMQTT/commits/main"))
        .and(header("Authorization", "token gh-token-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "sha": "3f2c9a" })))
        .mount(&server)
        .await;

    let commit = github(&server).latest_commit(&coremqtt(), "main").await.expect("commit");
    assert_eq!(commit, CommitId("3f2c9a".to_string()));
}

#[tokio::test]
async fn missing_branch_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/FreeRTOS/coreMQTT/commits/release-candidate"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "No commit found" })))
        .mount(&server)
        .await;

    let err = github(&server)
        .latest_commit(&coremqtt(), "release-candidate")
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::NotFound(what) if what.contains("release-candidate")));
}

#[tokio::test]
async fn server_error_is_a_request_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/FreeRTOS/coreMQTT/branches"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let err = github(&server).list_branches(&coremqtt()).await.unwrap_err();
    assert!(matches!(err, ProviderError::Request(msg) if msg.contains("502")));
}

#[tokio::test]
async fn unexpected_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/FreeRTOS/coreMQTT/commits/main"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let err = github(&server).latest_commit(&coremqtt(), "main").await.unwrap_err();
    assert!(matches!(err, ProviderError::Malformed(_)));
}

#[tokio::test]
async fn slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/FreeRTOS/coreMQTT/commits/main"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "sha": "abc" }))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let client = GithubClient::new(
        GithubConfig::new(Secret::new(TOKEN))
            .with_api_url(server.uri())
            .with_timeout(Duration::from_millis(100)),
    )
    .expect("github client");
    let err = client.latest_commit(&coremqtt(), "main").await.unwrap_err();
    assert_eq!(err, ProviderError::Timeout(Duration::from_millis(100)));
}

#[tokio::test]
async fn pinned_submodule_reads_contents_at_ref() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(
            "/repos/aws/aws-iot-device-sdk-embedded-C/contents/libraries/standard/coreMQTT",
        ))
        .and(query_param("ref", "release-candidate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "type": "submodule",
            "name": "coreMQTT",
            "sha": "9d1e4b",
            "submodule_git_url": "https://github.com/FreeRTOS/coreMQTT.git"
        })))
        .mount(&server)
        .await;

    let umbrella = RepoLocation::new("aws/aws-iot-device-sdk-embedded-C");
    let commit = github(&server)
        .pinned_submodule(
            &umbrella,
            Path::new("libraries/standard/coreMQTT"),
            "release-candidate",
        )
        .await
        .expect("pinned commit");
    assert_eq!(commit, CommitId("9d1e4b".to_string()));
}

#[tokio::test]
async fn directory_instead_of_submodule_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/aws/aws-iot-device-sdk-embedded-C/contents/demos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "type": "dir", "sha": "77aa" })))
        .mount(&server)
        .await;

    let umbrella = RepoLocation::new("aws/aws-iot-device-sdk-embedded-C");
    let err = github(&server)
        .pinned_submodule(&umbrella, Path::new("demos"), "release-candidate")
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Malformed(_)));
}

#[tokio::test]
async fn open_pull_requests_against_base() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/aws/aws-iot-device-sdk-embedded-C/pulls"))
        .and(query_param("state", "open"))
        .and(query_param("base", "release-candidate"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "number": 1412, "html_url": "https://github.com/aws/aws-iot-device-sdk-embedded-C/pull/1412" },
            { "number": 1420, "html_url": "https://github.com/aws/aws-iot-device-sdk-embedded-C/pull/1420" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let umbrella = RepoLocation::new("aws/aws-iot-device-sdk-embedded-C");
    let pulls = github(&server)
        .open_pull_requests(&umbrella, "release-candidate")
        .await
        .expect("pulls");
    let numbers: Vec<u64> = pulls.iter().map(|p| p.number).collect();
    assert_eq!(numbers, vec![1412, 1420]);
}

#[tokio::test]
async fn failing_check_run_fails_the_job() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/FreeRTOS/coreMQTT/commits/9d1e4b/check-runs"))
        .and(query_param("check_name", "unit-tests"))
        .and(query_param("filter", "latest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_count": 2,
            "check_runs": [
                { "name": "unit-tests", "status": "completed", "conclusion": "success" },
                { "name": "unit-tests", "status": "completed", "conclusion": "failure" }
            ]
        })))
        .mount(&server)
        .await;

    let job = JobRef::for_repository("unit-tests", coremqtt());
    let status = github(&server).job_status(&job, "9d1e4b").await.expect("status");
    assert_eq!(status, JobStatus::Fail);
}

#[tokio::test]
async fn combined_status_job_reads_commit_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/FreeRTOS/coreMQTT/commits/9d1e4b/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "state": "success", "statuses": [] })))
        .mount(&server)
        .await;

    let job = JobRef::for_repository(COMBINED_STATUS_JOB, coremqtt());
    let status = github(&server).job_status(&job, "9d1e4b").await.expect("status");
    assert_eq!(status, JobStatus::Pass);
}

#[tokio::test]
async fn github_reachability_uses_rate_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rate_limit"))
        .and(header("Authorization", "token gh-token-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "resources": {} })))
        .expect(1)
        .mount(&server)
        .await;

    VersionControlProvider::probe(&github(&server)).await.expect("reachable");
}

#[tokio::test]
async fn rejected_token_makes_github_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rate_limit"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "Bad credentials" })))
        .mount(&server)
        .await;

    let err = VersionControlProvider::probe(&github(&server)).await.unwrap_err();
    match err {
        ProviderError::Unavailable { system, detail } => {
            assert_eq!(system, "github");
            assert!(detail.contains("401"));
            assert!(!detail.contains(TOKEN));
        }
        other => panic!("expected unavailable, got {other:?}"),
    }
}

#[tokio::test]
async fn unstable_jenkins_build_fails_the_job() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/job/csdk/job/nightly/lastCompletedBuild/api/json"))
        .and(basic_auth("release", "jenkins-pw"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "number": 311,
            "result": "UNSTABLE",
            "building": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let job = JobRef::pipeline("job/csdk/job/nightly");
    let status = jenkins(&server)
        .job_status(&job, "lastCompletedBuild")
        .await
        .expect("status");
    assert_eq!(status, JobStatus::Fail);
}

#[tokio::test]
async fn running_jenkins_build_is_unknown() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/job/csdk/job/nightly/lastBuild/api/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": null, "building": true })))
        .mount(&server)
        .await;

    let job = JobRef::pipeline("job/csdk/job/nightly");
    let status = jenkins(&server).job_status(&job, "lastBuild").await.expect("status");
    assert_eq!(status, JobStatus::Unknown);
}

#[tokio::test]
async fn jenkins_reachability() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/json"))
        .and(basic_auth("release", "jenkins-pw"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "mode": "NORMAL" })))
        .expect(1)
        .mount(&server)
        .await;

    jenkins(&server).probe().await.expect("reachable");
}

#[tokio::test]
async fn jenkins_rejecting_credentials_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/json"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let err = jenkins(&server).probe().await.unwrap_err();
    assert!(matches!(err, ProviderError::Unavailable { system, .. } if system == "jenkins"));
}
