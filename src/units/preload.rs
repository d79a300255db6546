use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use futures::future::join_all;
use log::warn;

use super::{InitFlags, InitUnit, UnitFactory};
use crate::cache::ResourceCache;
use crate::types::UnitDecl;

/// Warms the resource cache during startup: the main phase loads every
/// declared key concurrently, with the unit's name as the owner tag.
pub struct PreloadUnit {
    name: String,
    order: i32,
    group: String,
    use_pre_init: bool,
    resources: Vec<String>,
    cache: Arc<ResourceCache>,
    flags: InitFlags,
}

impl PreloadUnit {
    pub fn new(decl: &UnitDecl, cache: Arc<ResourceCache>) -> Self {
        Self {
            name: decl.name.clone(),
            order: decl.order,
            group: decl.group.clone(),
            use_pre_init: decl.use_pre_init,
            resources: decl.resources.clone(),
            cache,
            flags: InitFlags::new(),
        }
    }
}

#[async_trait]
impl InitUnit for PreloadUnit {
    fn name(&self) -> &str {
        &self.name
    }

    fn order(&self) -> i32 {
        self.order
    }

    fn group_name(&self) -> &str {
        &self.group
    }

    fn use_pre_init(&self) -> bool {
        self.use_pre_init
    }

    fn flags(&self) -> &InitFlags {
        &self.flags
    }

    async fn init(&self) -> Result<()> {
        let loads = self
            .resources
            .iter()
            .map(|key| self.cache.load_owned(key, &self.name));
        let results = join_all(loads).await;

        // The cache absorbs and logs each failure; here only the tally is
        // worth a line.
        let missing = results.iter().filter(|result| result.is_none()).count();
        if missing > 0 {
            warn!(
                "[{}] {} of {} resources failed to preload",
                self.name,
                missing,
                self.resources.len()
            );
        }
        Ok(())
    }
}

/// Factory that turns manifest declarations into [`PreloadUnit`]s sharing
/// one cache.
pub struct PreloadFactory {
    cache: Arc<ResourceCache>,
}

impl PreloadFactory {
    pub fn new(cache: Arc<ResourceCache>) -> Self {
        Self { cache }
    }
}

impl UnitFactory for PreloadFactory {
    fn build(&self, decl: &UnitDecl) -> Option<Arc<dyn InitUnit>> {
        Some(Arc::new(PreloadUnit::new(decl, self.cache.clone())))
    }
}
