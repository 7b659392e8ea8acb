//! Mock gallery site shared by the integration tests

use gallery_archive::config::UserAgentConfig;
use gallery_archive::crawler::{
    ArchiveRun, HtmlSiteParser, HttpFetcher, RetryPolicy, SessionCookies, SiteUrls, Throttle,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const ARTIST: &str = "someone";

/// Listing page with the given ids; `has_next` adds the "Next" button
pub fn gallery_listing(ids: &[u32], has_next: bool) -> String {
    let figures: String = ids
        .iter()
        .map(|id| format!(r#"<figure id="sid-{0}"><a href="/view/{0}/">#{0}</a></figure>"#, id))
        .collect();
    let next = if has_next {
        r#"<form action="next" method="get"><button class="button standard" type="submit">Next</button></form>"#
    } else {
        ""
    };
    format!(
        "<html><body><section class=\"gallery\">{}</section>{}</body></html>",
        figures, next
    )
}

pub fn journal_listing(ids: &[u32], has_next: bool) -> String {
    let sections: String = ids
        .iter()
        .map(|id| format!(r#"<section id="jid:{0}"><h2>Journal {0}</h2></section>"#, id))
        .collect();
    let older = if has_next {
        r#"<a class="button standard" href="next">Older</a>"#
    } else {
        ""
    };
    format!("<html><body>{}{}</body></html>", sections, older)
}

pub fn submission_page(id: u32, with_thumbnail: bool) -> String {
    let thumbnail = if with_thumbnail {
        format!(
            r#"<img id="submissionImg" data-preview-src="/thumbs/{}.jpg" src="x">"#,
            id
        )
    } else {
        String::new()
    };
    format!(
        r#"<html><body>
            {thumbnail}
            <div class="submission-title"><h2>Submission {id}</h2></div>
            <span class="popup_date" title="Mar 4th, 2022 10:15 AM">a year ago</span>
            <div class="submission-description">Description of {id}</div>
            <section class="tags-row"><a>fox</a><a>sketch</a></section>
            <div class="download"><a href="/media/{id}.png">Download</a></div>
        </body></html>"#,
        thumbnail = thumbnail,
        id = id
    )
}

pub fn journal_page(id: u32) -> String {
    format!(
        r#"<html><body>
            <h2 class="journal-title">Journal {id}</h2>
            <span class="popup_date">Jan 09, 2021 08:00 PM</span>
            <div class="journal-content"><p>Text of journal {id}</p></div>
        </body></html>"#,
        id = id
    )
}

pub async fn mount_page(server: &MockServer, page_path: &str, status: u16, body: String) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(
            ResponseTemplate::new(status)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

/// Mounts listing pages for a section; the last page has no next control
pub async fn mount_listing(server: &MockServer, section: &str, pages: &[&[u32]]) {
    for (index, ids) in pages.iter().enumerate() {
        let has_next = index + 1 < pages.len();
        let body = if section == "journals" {
            journal_listing(ids, has_next)
        } else {
            gallery_listing(ids, has_next)
        };
        let page_path = format!("/{}/{}/{}/", section, ARTIST, index + 1);
        mount_page(server, &page_path, 200, body).await;
    }
}

/// Mounts item pages and media files of submissions
pub async fn mount_submissions(server: &MockServer, ids: &[u32]) {
    for &id in ids {
        mount_page(server, &format!("/view/{}/", id), 200, submission_page(id, false)).await;
        Mock::given(method("GET"))
            .and(path(format!("/media/{}.png", id)))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(format!("png {}", id)))
            .mount(server)
            .await;
    }
}

pub async fn mount_journals(server: &MockServer, ids: &[u32]) {
    for &id in ids {
        mount_page(server, &format!("/journal/{}/", id), 200, journal_page(id)).await;
    }
}

/// Mounts an artist with no scraps and no journals
pub async fn mount_empty_sections(server: &MockServer, sections: &[&str]) {
    for section in sections {
        mount_listing(server, section, &[&[]]).await;
    }
}

/// Builds a run against the mock server without throttling delays
pub fn build_run(server: &MockServer, root: &Path) -> ArchiveRun<HttpFetcher, HtmlSiteParser> {
    build_run_for(server, root, ARTIST)
}

pub fn build_run_for(
    server: &MockServer,
    root: &Path,
    artist: &str,
) -> ArchiveRun<HttpFetcher, HtmlSiteParser> {
    let site = SiteUrls::new(&server.uri(), artist).unwrap();
    let fetcher = HttpFetcher::new(&UserAgentConfig::default(), SessionCookies::default()).unwrap();

    ArchiveRun::new(root, site, fetcher, HtmlSiteParser::new())
        .with_throttle(Throttle::new(Duration::ZERO))
        .with_retry_policy(RetryPolicy::new(
            3,
            Duration::from_millis(10),
            2,
            Duration::from_millis(50),
        ))
        .with_config_hash("test".to_string())
}

/// Paths of all requests the server received so far
pub async fn request_paths(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|request| request.url.path().to_string())
        .collect()
}

/// Relative paths and contents of every file below `dir`, sorted
pub fn snapshot(dir: &Path) -> Vec<(PathBuf, Vec<u8>)> {
    let mut files = Vec::new();
    let mut stack = vec![dir.to_path_buf()];
    while let Some(current) = stack.pop() {
        for entry in std::fs::read_dir(&current).unwrap() {
            let entry_path = entry.unwrap().path();
            if entry_path.is_dir() {
                stack.push(entry_path);
            } else {
                let relative = entry_path.strip_prefix(dir).unwrap().to_path_buf();
                files.push((relative, std::fs::read(&entry_path).unwrap()));
            }
        }
    }
    files.sort();
    files
}
