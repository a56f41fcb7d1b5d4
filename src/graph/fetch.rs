use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::blocking::Client;
use serde::Serialize;
use tracing::debug;
use url::Url;

use super::records::{BubbleRecord, RawGraph, parse_bubbles, parse_graph};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoints {
    pub graph: Url,
    pub entity: Url,
    pub bubble: Url,
}

#[derive(Clone, Debug)]
pub enum DataSource {
    Http { endpoints: Endpoints, client: Client },
    File(PathBuf),
}

impl DataSource {
    pub fn http(endpoints: Endpoints) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self::Http { endpoints, client })
    }
}

/// One view of one dataset. Navigation produces a new `Entity` request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViewRequest {
    Graph { dataset: String },
    Entity { dataset: String, entity: String },
    Bubble { dataset: String },
}

impl ViewRequest {
    pub fn dataset(&self) -> &str {
        match self {
            Self::Graph { dataset } | Self::Entity { dataset, .. } | Self::Bubble { dataset } => {
                dataset
            }
        }
    }
}

impl fmt::Display for ViewRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Graph { dataset } => write!(f, "graph/{dataset}"),
            Self::Entity { dataset, entity } => write!(f, "entityTripleGraph/{dataset}/{entity}"),
            Self::Bubble { dataset } => write!(f, "personbubble/{dataset}"),
        }
    }
}

#[derive(Clone, Debug)]
pub enum Payload {
    Graph(RawGraph),
    Bubbles(Vec<BubbleRecord>),
}

#[derive(Serialize)]
struct EntityQuery<'a> {
    #[serde(rename = "dbName")]
    db_name: &'a str,
    #[serde(rename = "entityName")]
    entity_name: &'a str,
}

pub fn dataset_url(base: &Url, dataset: &str) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| anyhow!("endpoint {base} cannot take a dataset path segment"))?
        .pop_if_empty()
        .push(dataset);
    Ok(url)
}

fn get_text(client: &Client, url: Url) -> Result<String> {
    debug!(%url, "GET");
    client
        .get(url.clone())
        .send()
        .with_context(|| format!("request to {url} failed"))?
        .error_for_status()
        .with_context(|| format!("{url} answered with an error status"))?
        .text()
        .with_context(|| format!("failed to read response body from {url}"))
}

fn post_entity(client: &Client, url: &Url, dataset: &str, entity: &str) -> Result<String> {
    debug!(%url, dataset, entity, "POST");
    client
        .post(url.clone())
        .json(&EntityQuery {
            db_name: dataset,
            entity_name: entity,
        })
        .send()
        .with_context(|| format!("request to {url} failed"))?
        .error_for_status()
        .with_context(|| format!("{url} answered with an error status"))?
        .text()
        .with_context(|| format!("failed to read response body from {url}"))
}

pub fn fetch(source: &DataSource, request: &ViewRequest) -> Result<Payload> {
    let body = match source {
        DataSource::File(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        DataSource::Http { endpoints, client } => match request {
            ViewRequest::Graph { dataset } => {
                get_text(client, dataset_url(&endpoints.graph, dataset)?)?
            }
            ViewRequest::Bubble { dataset } => {
                get_text(client, dataset_url(&endpoints.bubble, dataset)?)?
            }
            ViewRequest::Entity { dataset, entity } => {
                post_entity(client, &endpoints.entity, dataset, entity)?
            }
        },
    };

    let payload = match request {
        ViewRequest::Bubble { .. } => Payload::Bubbles(
            parse_bubbles(&body).with_context(|| format!("bad payload for {request}"))?,
        ),
        ViewRequest::Graph { .. } | ViewRequest::Entity { .. } => Payload::Graph(
            parse_graph(&body).with_context(|| format!("bad payload for {request}"))?,
        ),
    };
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn dataset_becomes_an_encoded_path_segment() {
        let base = Url::parse("http://localhost:8080/api/graphData").unwrap();
        let url = dataset_url(&base, "my db").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/graphData/my%20db");

        let trailing = Url::parse("http://localhost:8080/api/graphData/").unwrap();
        assert_eq!(dataset_url(&trailing, "db").unwrap().path(), "/api/graphData/db");
    }

    #[test]
    fn file_source_reads_graph_payload() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"nodes":[{{"id":"a","label":"A","group":1}}],"links":[]}}"#
        )
        .unwrap();

        let source = DataSource::File(file.path().to_path_buf());
        let request = ViewRequest::Graph {
            dataset: "db".to_owned(),
        };
        let Payload::Graph(graph) = fetch(&source, &request).unwrap() else {
            panic!("expected a graph payload");
        };
        assert_eq!(graph.nodes.len(), 1);
    }

    #[test]
    fn file_source_reads_bubble_payload() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"entity":"Kim","frequency":4}}]"#).unwrap();

        let source = DataSource::File(file.path().to_path_buf());
        let request = ViewRequest::Bubble {
            dataset: "db".to_owned(),
        };
        let Payload::Bubbles(records) = fetch(&source, &request).unwrap() else {
            panic!("expected bubble records");
        };
        assert_eq!(records[0].frequency, 4.0);
    }

    #[test]
    fn missing_file_is_an_error() {
        let source = DataSource::File(PathBuf::from("/definitely/not/here.json"));
        let request = ViewRequest::Graph {
            dataset: "db".to_owned(),
        };
        assert!(fetch(&source, &request).is_err());
    }

    #[test]
    fn request_display_matches_route_shape() {
        let request = ViewRequest::Entity {
            dataset: "db".to_owned(),
            entity: "Kim".to_owned(),
        };
        assert_eq!(request.to_string(), "entityTripleGraph/db/Kim");
        assert_eq!(request.dataset(), "db");
    }
}
