//! The seam between the worker and a concrete cluster.

use crate::error::Result;
use crate::model::AppSnapshot;

pub trait ClusterBackend: Send {
    /// Short name for logs and the startup banner, e.g. `kubernetes`.
    fn name(&self) -> &str;

    /// Every scalable app, enabled or not.
    fn list_apps(&mut self) -> Result<Vec<AppSnapshot>>;

    /// Request `replicas` instances of the app called `id`.
    fn scale_app(&mut self, id: &str, replicas: u32) -> Result<()>;
}

impl<B: ClusterBackend + ?Sized> ClusterBackend for Box<B> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn list_apps(&mut self) -> Result<Vec<AppSnapshot>> {
        (**self).list_apps()
    }

    fn scale_app(&mut self, id: &str, replicas: u32) -> Result<()> {
        (**self).scale_app(id, replicas)
    }
}
