use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use gist_shell::github::{
    ApiRequest, ApiResponse, GistHandler, GitHubClient, ListOptions, PageCursor, Transport,
};
use gist_shell::{GistError, Result};
use reqwest::header::{HeaderValue, LINK};
use reqwest::StatusCode;

/// Three pages of public gists, one gist each
struct PublicGists {
    requested: Arc<Mutex<Vec<String>>>,
    fail_page: Option<u32>,
}

fn gist_json(page: u32) -> String {
    format!(
        r#"{{"id": "g{page}", "public": true, "html_url": "https://gist.github.com/g{page}", "git_pull_url": "https://gist.github.com/g{page}.git", "git_push_url": "https://gist.github.com/g{page}.git", "files": {{}}, "created_at": "2017-02-18T09:12:44Z", "updated_at": "2017-02-18T09:12:44Z"}}"#
    )
}

#[async_trait]
impl Transport for PublicGists {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let page: u32 = request.query_value("page").unwrap().parse().unwrap();
        self.requested
            .lock()
            .unwrap()
            .push(format!("{}?page={}", request.url.path(), page));

        if self.fail_page == Some(page) {
            return Ok(ApiResponse::new(
                StatusCode::BAD_GATEWAY,
                r#"{"message": "Server Error"}"#,
            ));
        }

        let mut response = ApiResponse::new(StatusCode::OK, format!("[{}]", gist_json(page)));
        if page < 3 {
            let link = format!(
                "<https://api.github.com/gists/public?page={}>; rel=\"next\", <https://api.github.com/gists/public?page=3>; rel=\"last\"",
                page + 1
            );
            response = response.with_header(LINK, HeaderValue::from_str(&link).unwrap());
        }
        Ok(response)
    }
}

fn client(fail_page: Option<u32>) -> (GitHubClient, Arc<Mutex<Vec<String>>>) {
    let requested = Arc::new(Mutex::new(Vec::new()));
    let transport = PublicGists {
        requested: Arc::clone(&requested),
        fail_page,
    };
    let client = GitHubClient::with_transport("https://api.github.com", transport).unwrap();
    (client, requested)
}

#[tokio::test]
async fn listing_stops_at_the_page_limit() {
    let (client, requested) = client(None);

    let gists = GistHandler::new(&client, None)
        .with_cursor(PageCursor::new(1, 2))
        .list(&ListOptions::default())
        .await
        .unwrap();

    let ids: Vec<&str> = gists.iter().map(|gist| gist.id.as_str()).collect();
    assert_eq!(ids, vec!["g1", "g2"]);
    assert_eq!(
        *requested.lock().unwrap(),
        vec!["/gists/public?page=1", "/gists/public?page=2"]
    );
}

#[tokio::test]
async fn listing_follows_links_to_the_last_page() {
    let (client, requested) = client(None);

    let gists = GistHandler::new(&client, None)
        .with_cursor(PageCursor::new(1, 10))
        .list(&ListOptions::default())
        .await
        .unwrap();

    assert_eq!(gists.len(), 3);
    assert_eq!(requested.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn failed_page_aborts_the_listing() {
    let (client, _) = client(Some(3));

    let err = GistHandler::new(&client, None)
        .with_cursor(PageCursor::new(1, 10))
        .list(&ListOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, GistError::PageAborted { page: 3, status: 502 }));
}
