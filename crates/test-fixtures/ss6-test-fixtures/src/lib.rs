use std::cell::Cell as CountCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use serde::Deserialize;
use ss6_player::{Config, DefaultNodeFactory, MeshDesc, NodeFactory, Project, SharedNode};

pub mod memory;

pub use memory::{AnimDef, KeyDef, MemoryProject, PackDef, Pose, TrackDef};

static MANIFEST: Lazy<Manifest> = Lazy::new(|| {
    let raw = include_str!("../../../../fixtures/manifest.json");
    serde_json::from_str(raw).expect("fixtures manifest should parse")
});

#[derive(Debug, Deserialize)]
struct Manifest {
    projects: HashMap<String, String>,
}

fn fixtures_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures")
}

fn resolve_path(rel: &str) -> PathBuf {
    fixtures_root().join(rel)
}

fn read_to_string(rel: &str) -> Result<String> {
    let path = resolve_path(rel);
    fs::read_to_string(&path)
        .with_context(|| format!("failed to read fixture at {}", path.display()))
}

fn lookup<'a>(map: &'a HashMap<String, String>, kind: &str, name: &str) -> Result<&'a str> {
    map.get(name)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("unknown {kind} fixture '{name}'"))
}

pub mod projects {
    use super::*;

    pub fn keys() -> Vec<String> {
        MANIFEST.projects.keys().cloned().collect()
    }

    pub fn json(name: &str) -> Result<String> {
        let rel = lookup(&MANIFEST.projects, "project", name)?;
        read_to_string(rel)
    }

    pub fn load(name: &str) -> Result<MemoryProject> {
        let text = json(name)?;
        MemoryProject::from_json(&text).with_context(|| format!("fixture '{name}'"))
    }

    pub fn path(name: &str) -> Result<PathBuf> {
        let rel = lookup(&MANIFEST.projects, "project", name)?;
        Ok(resolve_path(rel))
    }
}

/// Node factory that counts what it creates.
#[derive(Debug, Default)]
pub struct CountingFactory {
    inner: DefaultNodeFactory,
    nodes: CountCell<usize>,
    meshes: CountCell<usize>,
}

impl CountingFactory {
    pub fn nodes_created(&self) -> usize {
        self.nodes.get()
    }

    pub fn meshes_created(&self) -> usize {
        self.meshes.get()
    }
}

impl NodeFactory for CountingFactory {
    fn create_node(&self) -> SharedNode {
        self.nodes.set(self.nodes.get() + 1);
        self.inner.create_node()
    }

    fn create_mesh(&self, desc: MeshDesc) -> SharedNode {
        self.meshes.set(self.meshes.get() + 1);
        self.inner.create_mesh(desc)
    }
}

/// Project over `data` with default config and the in-memory node factory.
pub fn project(data: MemoryProject) -> Project {
    Project::from_source(Rc::new(data))
}

/// Project over `data` with a shared [`CountingFactory`] and `config`.
pub fn counting_project(data: MemoryProject, config: Config) -> (Project, Rc<CountingFactory>) {
    let factory = Rc::new(CountingFactory::default());
    let project = Project::new(Rc::new(data), factory.clone(), config);
    (project, factory)
}

/// Load a manifest fixture straight into a [`Project`].
pub fn load_project(name: &str) -> Result<Project> {
    projects::load(name).map(project)
}
