use crate::models::{Project, SearchHit, SearchResponse, Version, VersionFile};

pub const DEFAULT_API_BASE: &str = "https://api.modrinth.com/v2";

/// Thin client over the catalog REST API.
///
/// Holds the base URL so tests can point it at a mock server.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    client: reqwest::Client,
    base_url: String,
}

impl CatalogClient {
    pub fn new() -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: crate::http_client::build_client(None)?,
            base_url: DEFAULT_API_BASE.to_string(),
        })
    }

    #[allow(dead_code)] // Used by tests to point at a mock server
    pub fn with_base_url(base_url: &str) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: crate::http_client::build_client(None)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Search the catalog, one hit per matching project
    pub async fn search_projects(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<SearchHit>, reqwest::Error> {
        let url = format!(
            "{}/search?query={}&limit={}",
            self.base_url,
            urlencoding::encode(query),
            limit
        );

        let response = self.client.get(&url).send().await?.error_for_status()?;
        let results: SearchResponse = response.json().await?;

        Ok(results.hits)
    }

    /// Fetch the full project record for a slug
    pub async fn fetch_project(&self, slug: &str) -> Result<Project, reqwest::Error> {
        let url = format!("{}/project/{}", self.base_url, urlencoding::encode(slug));

        let response = self.client.get(&url).send().await?.error_for_status()?;
        let project: Project = response.json().await?;

        Ok(project)
    }

    /// Fetch all published versions of a project, newest first
    pub async fn fetch_versions(&self, slug: &str) -> Result<Vec<Version>, reqwest::Error> {
        let url = format!(
            "{}/project/{}/version",
            self.base_url,
            urlencoding::encode(slug)
        );

        let response = self.client.get(&url).send().await?.error_for_status()?;
        let versions: Vec<Version> = response.json().await?;

        Ok(versions)
    }

    /// Fetch a project's icon image as raw bytes
    pub async fn fetch_icon(&self, icon_url: &str) -> Result<Vec<u8>, reqwest::Error> {
        let response = self.client.get(icon_url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;

        Ok(bytes.to_vec())
    }
}

/// Pick the file to download from a version's file list.
///
/// Preference order: primary jar, any primary file, first file.
pub fn select_primary_file(version: &Version) -> Option<&VersionFile> {
    version
        .files
        .iter()
        .find(|f| f.primary && f.url.ends_with(".jar"))
        .or_else(|| version.files.iter().find(|f| f.primary))
        .or_else(|| version.files.first())
}

/// Resolve a version by version number or id, falling back to the newest
pub fn resolve_version<'a>(versions: &'a [Version], selector: Option<&str>) -> Option<&'a Version> {
    match selector {
        Some(wanted) => versions
            .iter()
            .find(|v| v.version_number == wanted || v.id == wanted),
        None => versions.first(),
    }
}

/// Basename of a download URL, used as the local filename
pub fn filename_from_url(url: &str) -> String {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or(url)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FileHashes;

    fn file(url: &str, primary: bool) -> VersionFile {
        VersionFile {
            url: url.to_string(),
            filename: filename_from_url(url),
            primary,
            size: 1024,
            hashes: FileHashes::default(),
        }
    }

    fn version(files: Vec<VersionFile>) -> Version {
        Version {
            id: "AAAAAAAA".to_string(),
            project_id: "BBBBBBBB".to_string(),
            name: "Test Release".to_string(),
            version_number: "1.0.0".to_string(),
            game_versions: vec!["1.20.1".to_string()],
            loaders: vec!["fabric".to_string()],
            version_type: Some("release".to_string()),
            date_published: None,
            downloads: 0,
            files,
        }
    }

    #[test]
    fn test_primary_jar_wins() {
        let v = version(vec![
            file("https://cdn.example/sources.zip", true),
            file("https://cdn.example/mod-1.0.0.jar", true),
        ]);
        assert_eq!(
            select_primary_file(&v).unwrap().filename,
            "mod-1.0.0.jar"
        );
    }

    #[test]
    fn test_primary_fallback_then_first() {
        let v = version(vec![
            file("https://cdn.example/extra.zip", false),
            file("https://cdn.example/pack.zip", true),
        ]);
        assert_eq!(select_primary_file(&v).unwrap().filename, "pack.zip");

        let v = version(vec![file("https://cdn.example/only.zip", false)]);
        assert_eq!(select_primary_file(&v).unwrap().filename, "only.zip");
    }

    #[test]
    fn test_empty_file_list() {
        let v = version(vec![]);
        assert!(select_primary_file(&v).is_none());
    }

    #[test]
    fn test_resolve_version_by_number_and_id() {
        let mut newer = version(vec![]);
        newer.version_number = "2.0.0".to_string();
        newer.id = "newid123".to_string();
        let older = version(vec![]);

        let versions = vec![newer, older];
        assert_eq!(
            resolve_version(&versions, None).unwrap().version_number,
            "2.0.0"
        );
        assert_eq!(
            resolve_version(&versions, Some("1.0.0")).unwrap().version_number,
            "1.0.0"
        );
        assert_eq!(
            resolve_version(&versions, Some("newid123")).unwrap().version_number,
            "2.0.0"
        );
        assert!(resolve_version(&versions, Some("9.9.9")).is_none());
    }

    #[test]
    fn test_filename_from_url() {
        assert_eq!(
            filename_from_url("https://cdn.example/data/abc/mod-1.2.jar"),
            "mod-1.2.jar"
        );
        assert_eq!(filename_from_url("mod.jar"), "mod.jar");
        assert_eq!(filename_from_url("https://cdn.example/dir/"), "dir");
    }
}

#[cfg(test)]
mod endpoint_tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_search_populates_one_entry_per_hit() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET)
                .path("/search")
                .query_param("query", "sodium")
                .query_param("limit", "20");
            then.status(200).json_body(json!({
                "hits": [
                    {
                        "project_id": "AANobbMI",
                        "slug": "sodium",
                        "title": "Sodium",
                        "description": "A modern rendering engine",
                        "author": "jellysquid3",
                        "downloads": 1000000,
                        "follows": 9000,
                        "icon_url": "https://cdn.example/icon.png"
                    },
                    {
                        "project_id": "gvQqBUqZ",
                        "slug": "lithium",
                        "title": "Lithium",
                        "description": "A general-purpose optimization mod",
                        "author": "jellysquid3",
                        "downloads": 500000,
                        "follows": 4000,
                        "icon_url": null
                    }
                ],
                "offset": 0,
                "limit": 20,
                "total_hits": 2
            }));
        });

        let client = CatalogClient::with_base_url(&server.base_url()).unwrap();
        let hits = client.search_projects("sodium", 20).await.unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].slug, "sodium");
        assert_eq!(hits[0].title, "Sodium");
        assert_eq!(hits[1].slug, "lithium");
        assert!(hits[1].icon_url.is_none());
    }

    #[tokio::test]
    async fn test_search_non_200_is_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/search");
            then.status(500).body("internal error");
        });

        let client = CatalogClient::with_base_url(&server.base_url()).unwrap();
        let result = client.search_projects("anything", 20).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_search_encodes_query() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/search")
                .query_param("query", "create mod");
            then.status(200).json_body(json!({
                "hits": [], "offset": 0, "limit": 20, "total_hits": 0
            }));
        });

        let client = CatalogClient::with_base_url(&server.base_url()).unwrap();
        let hits = client.search_projects("create mod", 20).await.unwrap();

        mock.assert();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_project_detail() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/project/sodium");
            then.status(200).json_body(json!({
                "id": "AANobbMI",
                "slug": "sodium",
                "title": "Sodium",
                "description": "A modern rendering engine",
                "icon_url": "https://cdn.example/icon.png",
                "downloads": 1000000,
                "followers": 9000,
                "categories": ["optimization"],
                "game_versions": ["1.20.1", "1.21"],
                "loaders": ["fabric"]
            }));
        });

        let client = CatalogClient::with_base_url(&server.base_url()).unwrap();
        let project = client.fetch_project("sodium").await.unwrap();

        assert_eq!(project.slug, "sodium");
        assert_eq!(project.categories, vec!["optimization"]);
        assert_eq!(
            project.icon_url.as_deref(),
            Some("https://cdn.example/icon.png")
        );
    }

    #[tokio::test]
    async fn test_fetch_versions_list() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/project/sodium/version");
            then.status(200).json_body(json!([
                {
                    "id": "xuWxRZPd",
                    "project_id": "AANobbMI",
                    "name": "Sodium 0.5.8",
                    "version_number": "mc1.20.1-0.5.8",
                    "game_versions": ["1.20.1"],
                    "loaders": ["fabric"],
                    "version_type": "release",
                    "downloads": 12345,
                    "files": [
                        {
                            "url": "https://cdn.example/sodium-0.5.8.jar",
                            "filename": "sodium-0.5.8.jar",
                            "primary": true,
                            "size": 2048,
                            "hashes": { "sha1": "aa", "sha512": "bb" }
                        }
                    ]
                }
            ]));
        });

        let client = CatalogClient::with_base_url(&server.base_url()).unwrap();
        let versions = client.fetch_versions("sodium").await.unwrap();

        assert_eq!(versions.len(), 1);
        let file = select_primary_file(&versions[0]).unwrap();
        assert_eq!(file.filename, "sodium-0.5.8.jar");
        assert_eq!(file.hashes.sha512.as_deref(), Some("bb"));
    }

    #[tokio::test]
    async fn test_fetch_versions_non_200_is_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/project/unknown/version");
            then.status(404).body("not found");
        });

        let client = CatalogClient::with_base_url(&server.base_url()).unwrap();
        assert!(client.fetch_versions("unknown").await.is_err());
    }

    #[tokio::test]
    async fn test_fetch_icon_bytes() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/icon.png");
            then.status(200).body(b"\x89PNG fake bytes");
        });

        let client = CatalogClient::with_base_url(&server.base_url()).unwrap();
        let bytes = client
            .fetch_icon(&server.url("/icon.png"))
            .await
            .unwrap();

        assert_eq!(bytes, b"\x89PNG fake bytes");
    }
}
