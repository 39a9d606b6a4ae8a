// SPDX-License-Identifier: Apache-2.0

use crate::component::{Arguments, Component, Options};
use crate::featuregate::{Stability, check_allowed};
use figment::Figment;
use figment::providers::Serialized;
use figment::value::Dict;
use std::any::Any;
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use thiserror::Error;
use tower::BoxError;
use tracing::debug;

type LoadFn = Box<dyn Fn(&Dict) -> Result<Box<dyn Any + Send + Sync>, BoxError> + Send + Sync>;
type BuildFn = Box<
    dyn Fn(Options, &(dyn Any + Send + Sync)) -> Result<Box<dyn Component>, BoxError>
        + Send
        + Sync,
>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("component name {0:?} already registered")]
    Duplicate(String),

    #[error("invalid component name {0:?}: every dot-separated part must be an identifier")]
    InvalidName(String),

    #[error("component {0:?} must declare a stability level")]
    UndefinedStability(String),

    #[error("unknown component {0:?}")]
    UnknownComponent(String),

    #[error("arguments were loaded for component {got:?}, not {expected:?}")]
    ArgumentsMismatch { expected: String, got: String },
}

/// Catalog entry of a component type: its stable name, maturity, schema and
/// constructor.
pub struct Registration {
    name: &'static str,
    stability: Stability,
    args_type: &'static str,
    load: LoadFn,
    build: BuildFn,
}

impl Registration {
    /// Creates a registration whose schema is `A`. `build` receives the
    /// validated schema by reference; it must not keep it.
    pub fn new<A, B>(name: &'static str, stability: Stability, build: B) -> Self
    where
        A: Arguments,
        B: Fn(Options, &A) -> Result<Box<dyn Component>, BoxError> + Send + Sync + 'static,
    {
        let load: LoadFn = Box::new(move |block: &Dict| {
            let args = load_args::<A>(name, block)?;
            Ok(Box::new(args) as Box<dyn Any + Send + Sync>)
        });

        let build: BuildFn = Box::new(move |opts, args: &(dyn Any + Send + Sync)| {
            let args = args
                .downcast_ref::<A>()
                .ok_or_else(|| format!("arguments for {} have an unexpected type", name))?;
            build(opts, args)
        });

        Self {
            name,
            stability,
            args_type: std::any::type_name::<A>(),
            load,
            build,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn stability(&self) -> Stability {
        self.stability
    }
}

impl Debug for Registration {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name)
            .field("stability", &self.stability)
            .field("args", &self.args_type)
            .finish()
    }
}

/// Defaults `A`, overlays the user's block onto it and validates the result.
pub fn load_args<A: Arguments>(name: &str, block: &Dict) -> Result<A, BoxError> {
    let mut args = A::default();
    args.set_to_default();

    let args: A = Figment::from(Serialized::defaults(&args))
        .merge(Serialized::defaults(block))
        .extract()
        .map_err(|e| format!("invalid arguments for {}: {}", name, e))?;

    args.validate()?;

    Ok(args)
}

/// Validated arguments of one declared stage, ready to be built.
pub struct LoadedArgs {
    name: &'static str,
    inner: Box<dyn Any + Send + Sync>,
}

impl LoadedArgs {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn get<A: Arguments>(&self) -> Option<&A> {
        self.inner.downcast_ref::<A>()
    }
}

impl Debug for LoadedArgs {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "LoadedArgs{{name={}}}", self.name)
    }
}

/// Component catalog of the process. Populated during startup through
/// explicit `register` calls, read-only afterwards.
#[derive(Debug)]
pub struct Registry {
    min_stability: Stability,
    registrations: HashMap<&'static str, Registration>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(Stability::GenerallyAvailable)
    }
}

impl Registry {
    pub fn new(min_stability: Stability) -> Self {
        Self {
            min_stability,
            registrations: HashMap::new(),
        }
    }

    pub fn min_stability(&self) -> Stability {
        self.min_stability
    }

    pub fn register(&mut self, registration: Registration) -> Result<(), RegistryError> {
        let name = registration.name;
        if !valid_name(name) {
            return Err(RegistryError::InvalidName(name.to_string()));
        }
        if registration.stability == Stability::Undefined {
            return Err(RegistryError::UndefinedStability(name.to_string()));
        }
        if self.registrations.contains_key(name) {
            return Err(RegistryError::Duplicate(name.to_string()));
        }

        debug!(component = name, stability = %registration.stability, "Registered component");
        self.registrations.insert(name, registration);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Registration> {
        self.registrations.get(name)
    }

    /// Registrations sorted by name.
    pub fn registrations(&self) -> Vec<&Registration> {
        let mut regs: Vec<&Registration> = self.registrations.values().collect();
        regs.sort_by_key(|r| r.name);
        regs
    }

    /// Runs the configuration lifecycle of a declared stage: stability gate,
    /// defaulting, overlay of `block`, validation.
    pub fn load(&self, name: &str, block: &Dict) -> Result<LoadedArgs, BoxError> {
        let reg = self
            .get(name)
            .ok_or_else(|| RegistryError::UnknownComponent(name.to_string()))?;

        check_allowed(
            reg.stability,
            self.min_stability,
            &format!("component {:?}", reg.name),
        )?;

        let inner = (reg.load)(block)?;
        Ok(LoadedArgs {
            name: reg.name,
            inner,
        })
    }

    pub fn build(
        &self,
        name: &str,
        opts: Options,
        args: &LoadedArgs,
    ) -> Result<Box<dyn Component>, BoxError> {
        let reg = self
            .get(name)
            .ok_or_else(|| RegistryError::UnknownComponent(name.to_string()))?;

        if args.name != reg.name {
            return Err(RegistryError::ArgumentsMismatch {
                expected: reg.name.to_string(),
                got: args.name.to_string(),
            }
            .into());
        }

        debug!(component = reg.name, id = opts.id.as_str(), "Building component");
        (reg.build)(opts, args.inner.as_ref())
    }
}

fn valid_name(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
                }
                _ => false,
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use figment::value::Value;
    use serde::{Deserialize, Serialize};
    use tokio_util::sync::CancellationToken;

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct TestArgs {
        #[serde(default)]
        port: u16,
        #[serde(default)]
        label: String,
    }

    impl Arguments for TestArgs {
        fn set_to_default(&mut self) {
            self.port = 8080;
        }

        fn validate(&self) -> Result<(), BoxError> {
            if self.port == 0 {
                return Err("port cannot be zero".into());
            }
            Ok(())
        }
    }

    struct TestComponent {
        port: u16,
    }

    #[async_trait]
    impl Component for TestComponent {
        async fn run(self: Box<Self>, _cancel: CancellationToken) -> Result<(), BoxError> {
            if self.port == 8080 {
                Ok(())
            } else {
                Err("unexpected port".into())
            }
        }
    }

    fn test_registration(name: &'static str, stability: Stability) -> Registration {
        Registration::new(name, stability, |_opts, args: &TestArgs| {
            Ok(Box::new(TestComponent { port: args.port }) as Box<dyn Component>)
        })
    }

    fn block(entries: &[(&str, Value)]) -> Dict {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_register_duplicate() {
        let mut registry = Registry::new(Stability::Experimental);
        assert!(
            registry
                .register(test_registration("test.component", Stability::Experimental))
                .is_ok()
        );

        let res = registry.register(test_registration("test.component", Stability::Experimental));
        assert_eq!(
            Err(RegistryError::Duplicate("test.component".to_string())),
            res
        );
        assert_eq!(1, registry.registrations().len());
    }

    #[test]
    fn test_register_invalid_names() {
        let mut registry = Registry::new(Stability::Experimental);
        for name in ["", "test..component", "test.1component", "test.comp-onent"] {
            let res = registry.register(test_registration(name, Stability::Experimental));
            assert_eq!(Err(RegistryError::InvalidName(name.to_string())), res);
        }
    }

    #[test]
    fn test_register_undefined_stability() {
        let mut registry = Registry::new(Stability::Experimental);
        let res = registry.register(test_registration("test.component", Stability::Undefined));
        assert!(matches!(res, Err(RegistryError::UndefinedStability(_))));
    }

    #[test]
    fn test_registrations_sorted() {
        let mut registry = Registry::default();
        registry
            .register(test_registration("b.component", Stability::GenerallyAvailable))
            .unwrap();
        registry
            .register(test_registration("a.component", Stability::PublicPreview))
            .unwrap();

        let names: Vec<&str> = registry.registrations().iter().map(|r| r.name()).collect();
        assert_eq!(vec!["a.component", "b.component"], names);
    }

    #[test]
    fn test_load_defaults_then_overlay() {
        let mut registry = Registry::new(Stability::Experimental);
        registry
            .register(test_registration("test.component", Stability::Experimental))
            .unwrap();

        let loaded = registry.load("test.component", &Dict::new()).unwrap();
        assert_eq!(8080, loaded.get::<TestArgs>().unwrap().port);

        let loaded = registry
            .load(
                "test.component",
                &block(&[("label", Value::from("edge".to_string()))]),
            )
            .unwrap();
        let args = loaded.get::<TestArgs>().unwrap();
        assert_eq!(8080, args.port);
        assert_eq!("edge", args.label);
    }

    #[test]
    fn test_load_validation_error_unwrapped() {
        let mut registry = Registry::new(Stability::Experimental);
        registry
            .register(test_registration("test.component", Stability::Experimental))
            .unwrap();

        let err = registry
            .load("test.component", &block(&[("port", Value::from(0u16))]))
            .unwrap_err();
        assert_eq!("port cannot be zero", err.to_string());
    }

    #[test]
    fn test_load_type_error() {
        let mut registry = Registry::new(Stability::Experimental);
        registry
            .register(test_registration("test.component", Stability::Experimental))
            .unwrap();

        let err = registry
            .load(
                "test.component",
                &block(&[("port", Value::from("abc".to_string()))]),
            )
            .unwrap_err();
        assert!(err.to_string().contains("invalid arguments for test.component"));
    }

    #[test]
    fn test_load_below_min_stability() {
        let mut registry = Registry::new(Stability::GenerallyAvailable);
        registry
            .register(test_registration("test.component", Stability::Experimental))
            .unwrap();

        let err = registry.load("test.component", &Dict::new()).unwrap_err();
        assert!(
            err.to_string()
                .contains("component \"test.component\" is at stability level \"experimental\"")
        );
    }

    #[test]
    fn test_load_unknown() {
        let registry = Registry::default();
        let err = registry.load("missing.component", &Dict::new()).unwrap_err();
        assert!(err.to_string().contains("unknown component"));
    }

    #[tokio::test]
    async fn test_build_runs_component() {
        let mut registry = Registry::new(Stability::Experimental);
        registry
            .register(test_registration("test.component", Stability::Experimental))
            .unwrap();
        registry
            .register(test_registration("other.component", Stability::Experimental))
            .unwrap();

        let loaded = registry.load("test.component", &Dict::new()).unwrap();
        assert_eq!("test.component", loaded.name());

        let component = registry
            .build("test.component", Options::default(), &loaded)
            .unwrap();
        assert!(component.run(CancellationToken::new()).await.is_ok());

        let res = registry.build("other.component", Options::default(), &loaded);
        assert!(res.is_err());
    }
}
