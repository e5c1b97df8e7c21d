//! Route → page map.
//!
//! Exactly one page exists per route. A page whose render fails is evicted,
//! so the next request for that route starts over with a fresh page and a
//! fresh SSR module.

use std::sync::Arc;

use dashmap::DashMap;
use serde_json::{Map, Value};

use super::{Page, PageError};
use crate::{core::RoutePath, engine::Engine, log};

pub struct PageRegistry {
    engine: Arc<Engine>,
    pages: DashMap<RoutePath, Arc<Page>>,
}

impl PageRegistry {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self {
            engine,
            pages: DashMap::new(),
        }
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    /// Page of `route`, created unbuilt on first use.
    pub fn page(&self, route: &RoutePath) -> Arc<Page> {
        if let Some(page) = self.pages.get(route) {
            return Arc::clone(page.value());
        }
        let page = self
            .pages
            .entry(route.clone())
            .or_insert_with(|| Page::new(route.clone(), Arc::clone(&self.engine)));
        Arc::clone(page.value())
    }

    pub fn get(&self, route: &RoutePath) -> Option<Arc<Page>> {
        self.pages.get(route).map(|p| Arc::clone(p.value()))
    }

    /// Page whose display name is `name` (asset requests).
    pub fn find_by_name(&self, name: &str) -> Option<Arc<Page>> {
        self.pages
            .iter()
            .find(|entry| entry.value().name() == name)
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Render the full document of `route`.
    pub async fn render(
        &self,
        route: &RoutePath,
        locals: Map<String, Value>,
    ) -> Result<String, PageError> {
        self.render_page(route, locals, false).await
    }

    /// Render only the SSR html of `route`.
    pub async fn render_email(
        &self,
        route: &RoutePath,
        locals: Map<String, Value>,
    ) -> Result<String, PageError> {
        self.render_page(route, locals, true).await
    }

    async fn render_page(
        &self,
        route: &RoutePath,
        mut locals: Map<String, Value>,
        for_email: bool,
    ) -> Result<String, PageError> {
        let exclude = &self.engine.config().render.exclude_locals;
        locals.retain(|key, _| !exclude.contains(key));

        let page = self.page(route);
        match page.render(locals, for_email).await {
            Ok(html) => Ok(html),
            Err(err) => {
                self.evict(&page);
                Err(err)
            }
        }
    }

    /// Drop `page` if it is still the registered one, and release its resources.
    fn evict(&self, page: &Arc<Page>) {
        if self
            .pages
            .remove_if(page.route(), |_, current| Arc::ptr_eq(current, page))
            .is_some()
        {
            log!("page"; "evicted {} after a failed render", page.route());
        }
        page.close();
    }

    /// Close and drop every page.
    pub fn close_all(&self) {
        let pages: Vec<Arc<Page>> = self.pages.iter().map(|e| Arc::clone(e.value())).collect();
        self.pages.clear();
        for page in pages {
            page.close();
        }
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}
