//! Descriptor registry
//!
//! The entry point of the engine. Finished descriptors and member mappers are
//! cached in concurrent maps and shared read-only. Synthesis itself is
//! serialized: a caller that loses the race observes the winner's descriptor.
//!
//! A [`Session`] carries the state of one top-level request. Descriptors
//! synthesized for nested field types are staged there and published together
//! with the requested one, or not at all.

use crate::config::EmitOptions;
use crate::emit::dump::write_dump;
use crate::emit::{synthesize, Descriptor, MemberKind, MemberMapper, MemberMapperRequest};
use crate::error::EmitError;
use crate::hooks::{ExceptionHandler, IdentityMapper, LogExceptionHandler, ValueMapper};
use dashmap::DashMap;
use mapemit_sdk::{AttributeMetadataProvider, MetadataProvider, TypeRef};
use parking_lot::ReentrantMutex;
use rustc_hash::{FxHashSet, FxHasher};
use std::hash::BuildHasherDefault;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

type FxBuildHasher = BuildHasherDefault<FxHasher>;
type MapperKey = (TypeRef, String, MemberKind, bool, bool);

/// State of one top-level descriptor request
#[derive(Default)]
pub(crate) struct Session {
    in_flight: FxHashSet<TypeRef>,
    staged: Vec<(TypeRef, Arc<Descriptor>)>,
}

impl Session {
    fn staged(&self, ty: &TypeRef) -> Option<Arc<Descriptor>> {
        self.staged
            .iter()
            .find(|(staged, _)| staged == ty)
            .map(|(_, d)| d.clone())
    }
}

pub(crate) struct RegistryInner {
    pub provider: Arc<dyn MetadataProvider>,
    pub handler: Arc<dyn ExceptionHandler>,
    pub value_mapper: Arc<dyn ValueMapper>,
    pub options: EmitOptions,
    descriptors: DashMap<TypeRef, Arc<Descriptor>, FxBuildHasher>,
    mappers: DashMap<MapperKey, Arc<MemberMapper>, FxBuildHasher>,
    synthesis: ReentrantMutex<()>,
    synthesized: AtomicUsize,
}

impl RegistryInner {
    /// Descriptor of `ty`, synthesizing and publishing it when needed
    pub(crate) fn descriptor(self: &Arc<Self>, ty: &TypeRef) -> Result<Arc<Descriptor>, EmitError> {
        if let Some(found) = self.descriptors.get(ty) {
            return Ok(found.value().clone());
        }

        let _guard = self.synthesis.lock();
        if let Some(found) = self.descriptors.get(ty) {
            return Ok(found.value().clone());
        }

        let mut session = Session::default();
        self.descriptor_in(&mut session, ty)?;
        self.commit(session);

        self.descriptors
            .get(ty)
            .map(|found| found.value().clone())
            .ok_or_else(|| EmitError::NotMapped(ty.name().to_string()))
    }

    /// Descriptor of `ty` within an ongoing session; nothing is published
    pub(crate) fn descriptor_in(
        self: &Arc<Self>,
        session: &mut Session,
        ty: &TypeRef,
    ) -> Result<Arc<Descriptor>, EmitError> {
        if let Some(found) = self.descriptors.get(ty) {
            return Ok(found.value().clone());
        }
        if let Some(staged) = session.staged(ty) {
            return Ok(staged);
        }
        if !ty.is_class() {
            return Err(EmitError::NotAClass(ty.name().to_string()));
        }
        if !self.provider.is_mapped(ty) {
            return Err(EmitError::NotMapped(ty.name().to_string()));
        }

        let descriptor = if ty.is_abstract() {
            if !session.in_flight.insert(ty.clone()) {
                return Err(EmitError::CyclicSynthesis(ty.name().to_string()));
            }
            let result = synthesize(self, session, ty);
            session.in_flight.remove(ty);
            Descriptor::synthesized(ty, result?, self.handler.clone())
        } else {
            Descriptor::concrete(
                ty,
                self.handler.clone(),
                self.options.warn_on_unavailable_create,
            )
        };

        let descriptor = Arc::new(descriptor);
        session.staged.push((ty.clone(), descriptor.clone()));
        Ok(descriptor)
    }

    fn commit(&self, session: Session) {
        for (ty, descriptor) in session.staged {
            if descriptor.is_synthesized() {
                self.synthesized.fetch_add(1, Ordering::Relaxed);
                if let Some(dir) = &self.options.dump_dir {
                    if let Err(e) = write_dump(dir, &descriptor) {
                        tracing::warn!(ty = %ty, error = %e, "failed to write descriptor dump");
                    }
                }
            }
            self.descriptors.entry(ty).or_insert(descriptor);
        }
    }
}

/// Registry of mapping descriptors and member mappers
///
/// Cheap to clone; clones share caches.
#[derive(Clone)]
pub struct MapRegistry {
    inner: Arc<RegistryInner>,
}

impl MapRegistry {
    /// Registry with default options, logging handler and identity value hooks
    pub fn new<P: MetadataProvider + 'static>(provider: P) -> Self {
        Self::from_parts(
            Arc::new(provider),
            Arc::new(LogExceptionHandler),
            Arc::new(IdentityMapper),
            EmitOptions::default(),
        )
    }

    /// Registry with the given options
    pub fn with_options<P: MetadataProvider + 'static>(
        provider: P,
        options: EmitOptions,
    ) -> Result<Self, EmitError> {
        Self::builder(provider).options(options).build()
    }

    /// Start configuring a registry
    pub fn builder<P: MetadataProvider + 'static>(provider: P) -> MapRegistryBuilder {
        MapRegistryBuilder {
            provider: Arc::new(provider),
            handler: Arc::new(LogExceptionHandler),
            value_mapper: Arc::new(IdentityMapper),
            options: EmitOptions::default(),
        }
    }

    fn from_parts(
        provider: Arc<dyn MetadataProvider>,
        handler: Arc<dyn ExceptionHandler>,
        value_mapper: Arc<dyn ValueMapper>,
        options: EmitOptions,
    ) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                provider,
                handler,
                value_mapper,
                options,
                descriptors: DashMap::with_hasher(FxBuildHasher::default()),
                mappers: DashMap::with_hasher(FxBuildHasher::default()),
                synthesis: ReentrantMutex::new(()),
                synthesized: AtomicUsize::new(0),
            }),
        }
    }

    /// Descriptor of the mapped type `ty`
    ///
    /// Abstract types get a synthesized concrete implementation; the first
    /// call pays for synthesis, later calls return the cached descriptor.
    pub fn descriptor(&self, ty: &TypeRef) -> Result<Arc<Descriptor>, EmitError> {
        self.inner.descriptor(ty)
    }

    /// Member mapper for one record member
    pub fn member_mapper(
        &self,
        request: &MemberMapperRequest,
    ) -> Result<Arc<MemberMapper>, EmitError> {
        let key: MapperKey = (
            request.object_type.clone(),
            request.member_name.clone(),
            request.kind,
            request.create_get,
            request.create_set,
        );
        if let Some(found) = self.inner.mappers.get(&key) {
            return Ok(found.value().clone());
        }

        let mapper = Arc::new(MemberMapper::build(request, self.inner.value_mapper.clone())?);
        Ok(self.inner.mappers.entry(key).or_insert(mapper).value().clone())
    }

    /// Options in effect
    pub fn options(&self) -> &EmitOptions {
        &self.inner.options
    }

    /// Number of types synthesized so far
    pub fn synthesized_count(&self) -> usize {
        self.inner.synthesized.load(Ordering::Relaxed)
    }

    /// Check if a descriptor for `ty` is cached
    pub fn is_cached(&self, ty: &TypeRef) -> bool {
        self.inner.descriptors.contains_key(ty)
    }

    /// Number of cached descriptors
    pub fn cached_count(&self) -> usize {
        self.inner.descriptors.len()
    }
}

impl Default for MapRegistry {
    fn default() -> Self {
        Self::new(AttributeMetadataProvider)
    }
}

/// Builder for [`MapRegistry`]
pub struct MapRegistryBuilder {
    provider: Arc<dyn MetadataProvider>,
    handler: Arc<dyn ExceptionHandler>,
    value_mapper: Arc<dyn ValueMapper>,
    options: EmitOptions,
}

impl MapRegistryBuilder {
    /// Use `options`
    pub fn options(mut self, options: EmitOptions) -> Self {
        self.options = options;
        self
    }

    /// Route creation failures to `handler`
    pub fn exception_handler<H: ExceptionHandler + 'static>(mut self, handler: H) -> Self {
        self.handler = Arc::new(handler);
        self
    }

    /// Use `mapper` for member-mapper value conversion
    pub fn value_mapper<M: ValueMapper + 'static>(mut self, mapper: M) -> Self {
        self.value_mapper = Arc::new(mapper);
        self
    }

    /// Validate options and build the registry
    pub fn build(self) -> Result<MapRegistry, EmitError> {
        self.options.validate()?;
        Ok(MapRegistry::from_parts(
            self.provider,
            self.handler,
            self.value_mapper,
            self.options,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapemit_sdk::{ClassBuilder, PropertyDef, ScalarKind};

    fn person() -> TypeRef {
        ClassBuilder::new("Shop.Person")
            .abstract_class()
            .property(
                PropertyDef::new("Name", &TypeRef::scalar(ScalarKind::Str)).abstract_accessors(),
            )
            .default_constructor()
            .build()
            .unwrap()
    }

    #[test]
    fn test_descriptor_is_cached() {
        let registry = MapRegistry::default();
        let ty = person();

        let first = registry.descriptor(&ty).unwrap();
        let second = registry.descriptor(&ty).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(registry.is_cached(&ty));
        assert_eq!(registry.synthesized_count(), 1);
        assert_eq!(
            first.mapped_type().name(),
            "Shop.Person.MappingExtension.Person"
        );
    }

    #[test]
    fn test_custom_infix() {
        let options = EmitOptions {
            type_name_infix: "Impl".to_string(),
            ..EmitOptions::default()
        };
        let registry = MapRegistry::with_options(AttributeMetadataProvider, options).unwrap();
        let descriptor = registry.descriptor(&person()).unwrap();

        assert_eq!(descriptor.mapped_type().name(), "Shop.Person.Impl.Person");
    }

    #[test]
    fn test_invalid_options_rejected() {
        let options = EmitOptions {
            type_name_infix: String::new(),
            ..EmitOptions::default()
        };
        assert!(matches!(
            MapRegistry::with_options(AttributeMetadataProvider, options),
            Err(EmitError::Config(_))
        ));
    }

    #[test]
    fn test_scalar_is_not_a_class() {
        let registry = MapRegistry::default();
        let err = registry
            .descriptor(&TypeRef::scalar(ScalarKind::I32))
            .unwrap_err();
        assert!(matches!(err, EmitError::NotAClass(_)));
    }

    #[test]
    fn test_concrete_type_is_not_synthesized() {
        let registry = MapRegistry::default();
        let ty = ClassBuilder::new("Shop.Plain")
            .default_constructor()
            .build()
            .unwrap();

        let descriptor = registry.descriptor(&ty).unwrap();
        assert!(!descriptor.is_synthesized());
        assert_eq!(descriptor.mapped_type(), &ty);
        assert_eq!(registry.synthesized_count(), 0);
    }

    #[test]
    fn test_member_mapper_is_cached() {
        let registry = MapRegistry::default();
        let ty = ClassBuilder::new("Shop.Row")
            .field("Id", &TypeRef::scalar(ScalarKind::I32))
            .build()
            .unwrap();
        let request = MemberMapperRequest::field(&ty, "Id");

        let first = registry.member_mapper(&request).unwrap();
        let second = registry.member_mapper(&request).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
