use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use super::records::{RawGraph, RawNode};

pub type NodeIndex = usize;
pub type LinkIndex = usize;

pub const MEDIA_GROUP: i64 = 0;

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub id: String,
    pub label: String,
    pub group: i64,
}

impl Node {
    pub fn is_media(&self) -> bool {
        self.group == MEDIA_GROUP
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Link {
    pub id: Option<String>,
    pub source: NodeIndex,
    pub target: NodeIndex,
    pub relation: String,
}

#[derive(Clone, Debug, Default)]
pub enum RelationFilter {
    /// Every fetched node and link is kept.
    #[default]
    PassThrough,
    /// Links of these relation types are dropped, then nodes are restricted to
    /// the endpoints of the surviving links.
    Exclude(HashSet<String>),
}

impl RelationFilter {
    pub fn exclude<I, S>(relations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Exclude(relations.into_iter().map(Into::into).collect())
    }

    fn keeps(&self, relation: &str) -> bool {
        match self {
            Self::PassThrough => true,
            Self::Exclude(excluded) => !excluded.contains(relation),
        }
    }
}

/// Index-addressed graph. Node `i` here and body `i` in the simulation
/// describe the same entity.
#[derive(Clone, Debug, Default)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
    index_by_id: HashMap<String, NodeIndex>,
    incident: Vec<Vec<LinkIndex>>,
}

impl Graph {
    pub fn build(raw: &RawGraph, filter: &RelationFilter) -> Self {
        let mut raw_by_id: HashMap<&str, &RawNode> = HashMap::with_capacity(raw.nodes.len());
        for node in &raw.nodes {
            if raw_by_id.insert(node.id.as_str(), node).is_some() {
                warn!(id = %node.id, "duplicate node id in payload, keeping the first record");
            }
        }

        let resolvable = raw
            .links
            .iter()
            .filter(|link| filter.keeps(&link.relation))
            .filter(|link| {
                let known = raw_by_id.contains_key(link.source.as_str())
                    && raw_by_id.contains_key(link.target.as_str());
                if !known {
                    warn!(
                        source = %link.source,
                        target = %link.target,
                        relation = %link.relation,
                        "dropping link with a missing endpoint"
                    );
                }
                known
            })
            .collect::<Vec<_>>();

        let endpoint_ids = match filter {
            RelationFilter::PassThrough => None,
            RelationFilter::Exclude(_) => Some(
                resolvable
                    .iter()
                    .flat_map(|link| [link.source.as_str(), link.target.as_str()])
                    .collect::<HashSet<_>>(),
            ),
        };

        let mut nodes = Vec::new();
        let mut index_by_id = HashMap::new();
        for node in &raw.nodes {
            if endpoint_ids
                .as_ref()
                .is_some_and(|ids| !ids.contains(node.id.as_str()))
            {
                continue;
            }
            if index_by_id.contains_key(&node.id) {
                continue;
            }

            index_by_id.insert(node.id.clone(), nodes.len());
            nodes.push(Node {
                id: node.id.clone(),
                label: node.label.clone(),
                group: node.group,
            });
        }

        let mut links = Vec::with_capacity(resolvable.len());
        let mut incident = vec![Vec::new(); nodes.len()];
        for link in resolvable {
            let (Some(&source), Some(&target)) = (
                index_by_id.get(&link.source),
                index_by_id.get(&link.target),
            ) else {
                continue;
            };

            let index = links.len();
            incident[source].push(index);
            if target != source {
                incident[target].push(index);
            }
            links.push(Link {
                id: link.id.clone(),
                source,
                target,
                relation: link.relation.clone(),
            });
        }

        debug!(
            raw_nodes = raw.nodes.len(),
            raw_links = raw.links.len(),
            nodes = nodes.len(),
            links = links.len(),
            "graph model built"
        );

        Self {
            nodes,
            links,
            index_by_id,
            incident,
        }
    }

    /// A graph with no nodes or no links is not worth simulating.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() || self.links.is_empty()
    }

    pub fn index_of(&self, id: &str) -> Option<NodeIndex> {
        self.index_by_id.get(id).copied()
    }

    pub fn incident_links(&self, node: NodeIndex) -> &[LinkIndex] {
        self.incident.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn link_key(&self, link: LinkIndex) -> String {
        self.links
            .get(link)
            .and_then(|entry| entry.id.clone())
            .unwrap_or_else(|| format!("linkPath-{link}"))
    }

    pub fn endpoints(&self) -> Vec<(NodeIndex, NodeIndex)> {
        self.links
            .iter()
            .map(|link| (link.source, link.target))
            .collect()
    }

    pub fn other_end(&self, link: LinkIndex, node: NodeIndex) -> Option<NodeIndex> {
        let entry = self.links.get(link)?;
        if entry.source == node {
            Some(entry.target)
        } else if entry.target == node {
            Some(entry.source)
        } else {
            None
        }
    }
}
