//! Shared context handed to every player: data source, node factory and config.

use std::fmt;
use std::rc::Rc;

use hashbrown::{HashMap, HashSet};

use crate::config::Config;
use crate::player::Player;
use crate::scene::{DefaultNodeFactory, NodeFactory};
use crate::source::AnimationDataSource;
use crate::Result;

/// Cheap to clone; nested players hold a clone of their parent's project.
#[derive(Clone)]
pub struct Project {
    data: Rc<dyn AnimationDataSource>,
    factory: Rc<dyn NodeFactory>,
    config: Rc<Config>,
}

impl fmt::Debug for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Project")
            .field("cells", &self.data.cell_count())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Project {
    pub fn new(
        data: Rc<dyn AnimationDataSource>,
        factory: Rc<dyn NodeFactory>,
        config: Config,
    ) -> Self {
        Self {
            data,
            factory,
            config: Rc::new(config),
        }
    }

    /// Project rendering into the in-memory [`DefaultNodeFactory`] nodes.
    pub fn from_source(data: Rc<dyn AnimationDataSource>) -> Self {
        Self::new(data, Rc::new(DefaultNodeFactory), Config::default())
    }

    #[inline]
    pub fn data(&self) -> &Rc<dyn AnimationDataSource> {
        &self.data
    }

    #[inline]
    pub fn factory(&self) -> &Rc<dyn NodeFactory> {
        &self.factory
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// `(pack, [animation…])` for every animation pack.
    pub fn animations(&self) -> Vec<(String, Vec<String>)> {
        self.data.animation_names()
    }

    /// Texture name → image path for every distinct cell map, with `root_path` prefixed.
    ///
    /// Cell maps are deduplicated by map index; the first cell seen for a map wins.
    pub fn texture_map(&self, root_path: &str) -> HashMap<String, String> {
        let mut seen = HashSet::new();
        let mut out = HashMap::new();
        for id in 0..self.data.cell_count() {
            let Ok(id) = i32::try_from(id) else {
                break;
            };
            let Some(cell) = self.data.cell(id) else {
                continue;
            };
            if !seen.insert(cell.map_index) {
                continue;
            }
            out.insert(
                cell.map_name.clone(),
                format!("{root_path}{}", cell.image_path),
            );
        }
        out
    }

    /// Player with nothing bound yet.
    pub fn create_player(&self) -> Player {
        Player::new(self.clone())
    }

    /// Player bound to `pack/anim`, idle on its first frame.
    pub fn create_player_for(&self, pack: &str, anim: &str) -> Result<Player> {
        let mut player = self.create_player();
        player.setup(pack, anim)?;
        Ok(player)
    }
}
