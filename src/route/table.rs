use std::fmt;
use std::sync::Arc;

use super::handler::{MethodHandler, SharedHandler};
use crate::methods::AllowedMethod;

/// Per-route handlers, one optional slot per [`AllowedMethod`].
pub struct MethodTable<Req, Res, Ctx> {
    slots: [Option<SharedHandler<Req, Res, Ctx>>; AllowedMethod::COUNT],
}

impl<Req, Res, Ctx> MethodTable<Req, Res, Ctx> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
        }
    }

    /// Register `handler` for `method`, returning the handler it replaced.
    pub fn insert<H>(
        &mut self,
        method: AllowedMethod,
        handler: H,
    ) -> Option<SharedHandler<Req, Res, Ctx>>
    where
        H: MethodHandler<Req, Res, Ctx>,
    {
        self.slots[method.index()].replace(Arc::new(handler))
    }

    #[must_use]
    pub fn get(&self, method: AllowedMethod) -> Option<&SharedHandler<Req, Res, Ctx>> {
        self.slots[method.index()].as_ref()
    }

    /// Look up a raw request method (any case). Methods outside the allowed set
    /// never match.
    #[must_use]
    pub fn lookup(&self, raw_method: &str) -> Option<&SharedHandler<Req, Res, Ctx>> {
        AllowedMethod::parse(raw_method).and_then(|m| self.get(m))
    }

    #[must_use]
    pub fn contains(&self, method: AllowedMethod) -> bool {
        self.slots[method.index()].is_some()
    }

    /// Methods with a registered handler, in table order.
    pub fn methods(&self) -> impl Iterator<Item = AllowedMethod> + '_ {
        AllowedMethod::ALL
            .into_iter()
            .filter(|m| self.contains(*m))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }
}

impl<Req, Res, Ctx> Default for MethodTable<Req, Res, Ctx> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Req, Res, Ctx> fmt::Debug for MethodTable<Req, Res, Ctx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.methods()).finish()
    }
}
