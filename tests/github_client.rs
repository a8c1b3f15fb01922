use feed_readme::cli::execute;
use feed_readme::github::{encode_content, GitHubClient};
use feed_readme::load_config::CliConfig;
use feed_readme_core::config::{RawInputs, Repository, RunConfig};
use feed_readme_core::contract::{DocumentStore, Feed, FeedItem, FileUpdate, MockFeedSource};
use feed_readme_core::error::{StoreError, SyncError};
use feed_readme_core::synchronise::synchronise;
use mockito::{Matcher, Server};
use serde_json::json;

const README: &str = "# Me\n<!--START_SECTION:feed-->\nold\n<!--END_SECTION:feed-->\n";
const CONTENTS_PATH: &str = "/repos/octocat/profile/contents/README.md";

fn client(server: &Server) -> GitHubClient {
    GitHubClient::new(
        reqwest::Client::new(),
        &server.url(),
        Repository::parse("octocat/profile").unwrap(),
        "gh-token".into(),
    )
}

fn contents_body(content: &str, sha: &str) -> String {
    json!({
        "type": "file",
        "encoding": "base64",
        "path": "README.md",
        "sha": sha,
        "content": encode_content(content),
    })
    .to_string()
}

#[tokio::test]
async fn read_asks_for_the_branch_and_decodes_the_file() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", CONTENTS_PATH)
        .match_query(Matcher::UrlEncoded("ref".into(), "dev".into()))
        .match_header("authorization", "Bearer gh-token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(contents_body(README, "sha-old"))
        .create_async()
        .await;

    let doc = client(&server).read("dev", "README.md").await.unwrap();
    assert_eq!(doc.content, README);
    assert_eq!(doc.sha, "sha-old");
    assert_eq!(doc.path, "README.md");
    mock.assert_async().await;
}

#[tokio::test]
async fn read_of_a_missing_file_is_not_found() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", CONTENTS_PATH)
        .match_query(Matcher::Any)
        .with_status(404)
        .with_body(r#"{"message":"Not Found"}"#)
        .create_async()
        .await;

    let err = client(&server).read("main", "README.md").await.unwrap_err();
    assert!(
        matches!(&err, StoreError::NotFound { path, branch } if path == "README.md" && branch == "main"),
        "got {err:?}"
    );
}

#[tokio::test]
async fn write_puts_message_content_sha_and_branch() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("PUT", CONTENTS_PATH)
        .match_header("authorization", "Bearer gh-token")
        .match_body(Matcher::Json(json!({
            "message": "Updating README",
            "content": encode_content("new text\n"),
            "sha": "sha-old",
            "branch": "dev",
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "content": {"path": "README.md", "sha": "sha-new"},
                "commit": {"sha": "commit-1"},
            })
            .to_string(),
        )
        .create_async()
        .await;

    let receipt = client(&server)
        .write(FileUpdate {
            path: "README.md".into(),
            branch: "dev".into(),
            content: "new text\n".into(),
            sha: "sha-old".into(),
            message: "Updating README".into(),
        })
        .await
        .unwrap();
    assert_eq!(receipt.content_sha, "sha-new");
    assert_eq!(receipt.commit_sha.as_deref(), Some("commit-1"));
    mock.assert_async().await;
}

#[tokio::test]
async fn default_branch_comes_from_the_repository() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/repos/octocat/profile")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"full_name":"octocat/profile","default_branch":"trunk"}"#)
        .create_async()
        .await;

    assert_eq!(client(&server).default_branch().await.unwrap(), "trunk");
    mock.assert_async().await;
}

#[tokio::test]
async fn stale_sha_on_write_is_a_concurrent_modification() {
    let mut server = Server::new_async().await;
    let _read = server
        .mock("GET", CONTENTS_PATH)
        .match_query(Matcher::UrlEncoded("ref".into(), "main".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(contents_body(README, "sha-old"))
        .create_async()
        .await;
    let write = server
        .mock("PUT", CONTENTS_PATH)
        .with_status(409)
        .with_body(r#"{"message":"README.md does not match sha-old"}"#)
        .expect(1)
        .create_async()
        .await;

    let mut feeds = MockFeedSource::new();
    feeds.expect_fetch().times(1).return_once(|_| {
        Ok(Feed {
            title: None,
            items: Some(vec![FeedItem::new()
                .with("title", "A")
                .with("link", "http://a")]),
        })
    });
    let config = RunConfig {
        feed_url: "https://blog.example.com/rss".into(),
        section: "feed".into(),
        empty_commits: false,
        max: 5,
        template: "- [{{title}}]({{link}})".into(),
        branch: "main".into(),
        path: "README.md".into(),
        commit_message: "Updating README".into(),
    };

    let err = synchronise(&config, &feeds, &client(&server))
        .await
        .unwrap_err();
    assert!(
        matches!(&err, SyncError::ConcurrentModification { path, sha } if path == "README.md" && sha == "sha-old"),
        "got {err:?}"
    );
    write.assert_async().await;
}

#[tokio::test]
async fn execute_without_a_branch_uses_the_repository_default() {
    let mut server = Server::new_async().await;
    let feed = server
        .mock("GET", "/feed.xml")
        .with_status(200)
        .with_header("content-type", "application/rss+xml")
        .with_body(
            r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>Blog</title><link>http://blog</link><description>d</description>
<item><title>First</title><link>http://blog/first</link></item>
</channel></rss>"#,
        )
        .create_async()
        .await;
    let repo = server
        .mock("GET", "/repos/octocat/profile")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"default_branch":"trunk"}"#)
        .expect(1)
        .create_async()
        .await;
    let read = server
        .mock("GET", CONTENTS_PATH)
        .match_query(Matcher::UrlEncoded("ref".into(), "trunk".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(contents_body(README, "sha-old"))
        .create_async()
        .await;
    let write = server
        .mock("PUT", CONTENTS_PATH)
        .match_body(Matcher::Json(json!({
            "message": "Updating README",
            "content": encode_content(
                "# Me\n<!--START_SECTION:feed-->\n- [First](http://blog/first)\n<!--END_SECTION:feed-->\n"
            ),
            "sha": "sha-old",
            "branch": "trunk",
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"content":{"sha":"sha-new"},"commit":{"sha":"commit-1"}}"#)
        .create_async()
        .await;

    let config = CliConfig {
        inputs: RawInputs {
            feed_url: format!("{}/feed.xml", server.url()),
            readme_section: "feed".into(),
            empty_commits: "false".into(),
            max: "5".into(),
            template: "- [{{title}}]({{link}})".into(),
            ..RawInputs::default()
        },
        repository: Repository::parse("octocat/profile").unwrap(),
        token: "gh-token".into(),
        api_url: server.url(),
        default_branch: None,
    };

    execute(config, reqwest::Client::new()).await.unwrap();

    feed.assert_async().await;
    repo.assert_async().await;
    read.assert_async().await;
    write.assert_async().await;
}
