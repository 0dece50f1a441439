use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use geom::Distance;
use serde::{Deserialize, Serialize};

use crate::error::config_error;
use crate::{EdgeID, ParkingError};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeID,
    pub length: Distance,
    /// Rails, bus-only lanes, and so on. Nobody parks here.
    #[serde(default)]
    pub transit_only: bool,
}

impl Edge {
    pub fn new(id: &str, length_meters: f64) -> Edge {
        Edge {
            id: EdgeID::from(id),
            length: Distance::meters(length_meters),
            transit_only: false,
        }
    }

    pub fn is_transit(&self) -> bool {
        self.transit_only || self.id.looks_like_transit()
    }
}

/// The static part of the network this crate cares about. Edges keep the order they were given
/// in; that order defines the rows of the cost table.
#[derive(Clone, Debug)]
pub struct Network {
    edges: Vec<Edge>,
    index: HashMap<EdgeID, usize>,
}

impl Network {
    pub fn new(edges: Vec<Edge>) -> Result<Network> {
        let mut index = HashMap::with_capacity(edges.len());
        for (idx, edge) in edges.iter().enumerate() {
            if index.insert(edge.id.clone(), idx).is_some() {
                config_error!("{} appears in the network twice", edge.id);
            }
            if edge.length < Distance::ZERO {
                config_error!("{} has negative length {}", edge.id, edge.length);
            }
        }
        Ok(Network { edges, index })
    }

    /// Reads a JSON list of edges.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Network> {
        let edges: Vec<Edge> = abstutil::read_json(path)?;
        Network::new(edges)
    }

    pub fn edges(&self) -> &Vec<Edge> {
        &self.edges
    }

    pub fn get(&self, id: &EdgeID) -> Result<&Edge> {
        match self.index.get(id) {
            Some(idx) => Ok(&self.edges[*idx]),
            None => Err(ParkingError::UnknownEdge(id.clone()).into()),
        }
    }

    pub fn contains(&self, id: &EdgeID) -> bool {
        self.index.contains_key(id)
    }

    /// Unknown edges are only transit if their name says so.
    pub fn is_transit(&self, id: &EdgeID) -> bool {
        match self.index.get(id) {
            Some(idx) => self.edges[*idx].is_transit(),
            None => id.looks_like_transit(),
        }
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}
