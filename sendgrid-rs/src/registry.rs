//! Model registry
//!
//! Services advertise themselves under a (namespace, family, name) model
//! identifier together with a constructor and a validation function. The
//! host plumbing looks models up here to validate, build, and invoke them.

use crate::config::ServiceConfig;
use crate::error::Result;
use crate::service::{EmailService, GenericService};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Model identifier, rendered `namespace:family:name`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Model {
    pub namespace: String,
    pub family: String,
    pub name: String,
}

impl Model {
    pub fn new(
        namespace: impl Into<String>,
        family: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            family: family.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.namespace, self.family, self.name)
    }
}

pub type Constructor = fn(&ServiceConfig) -> Result<Arc<dyn GenericService>>;
pub type Validator = fn(&ServiceConfig) -> Result<()>;

/// Constructor plus startup validator advertised for a model
pub struct Registration {
    pub constructor: Constructor,
    pub validator: Validator,
}

/// In-memory registry of service models
#[derive(Default)]
pub struct Registry {
    models: HashMap<String, Registration>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, model: Model, registration: Registration) {
        info!(model = %model, "registered model");
        self.models.insert(model.to_string(), registration);
    }

    /// Look up a registration by its rendered model id.
    pub fn lookup(&self, model: &str) -> Option<&Registration> {
        self.models.get(model)
    }

    pub fn model_count(&self) -> usize {
        self.models.len()
    }
}

/// Register this module's models.
pub fn register_models(registry: &mut Registry) {
    registry.register(
        Model::new("mcvella", "messaging", "sendgrid-email"),
        Registration {
            constructor: |config| {
                let service = EmailService::new(config)?;
                Ok(Arc::new(service) as Arc<dyn GenericService>)
            },
            validator: EmailService::validate,
        },
    );
}
