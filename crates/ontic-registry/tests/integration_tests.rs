//! Integration tests for capability discovery and explanation resolution
//!
//! These tests bind the in-memory backend through its provider catalog.

use ontic_domain::traits::SessionApiService;
use ontic_domain::{
    Context, ExplanationKind, ExplanationSpec, InferenceParameters, InferenceRequest,
    QueryAnswer, Sentence,
};
use ontic_memory::{InferenceScript, MemoryBackend, ScriptedAnswer};
use ontic_registry::{
    global, CapabilityKind, CapabilityRegistry, RegistryConfig, RegistryError, ResolveError,
    ServiceResolver,
};
use std::sync::Arc;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn discover(backend: &MemoryBackend, config: &RegistryConfig) -> CapabilityRegistry {
    CapabilityRegistry::discover(&backend.providers(), config).unwrap()
}

/// Answers for `(#$isa ?X #$Dog)`: Rex with a proof, Fido without
fn answers(backend: &MemoryBackend) -> Vec<QueryAnswer> {
    backend.script(
        "(#$isa ?X #$Dog)",
        InferenceScript::exhausted()
            .with_answer(ScriptedAnswer::new().bind("?X", "Rex"))
            .with_answer(ScriptedAnswer::new().bind("?X", "Fido").unproven()),
    );
    let channel = backend.current_session().unwrap().channel();
    let id = channel
        .submit(&InferenceRequest {
            sentence: Sentence::parse("(#$isa ?X #$Dog)").unwrap(),
            context: Context::default(),
            parameters: InferenceParameters::new(),
        })
        .unwrap();
    channel.answers(id, 0).unwrap()
}

#[test]
fn test_memory_backend_binds_every_capability() {
    init_tracing();
    let backend = MemoryBackend::new();
    let registry = discover(&backend, &RegistryConfig::strict());

    assert_eq!(registry.capability_count(), 4);
    assert!(registry.kb_api_service(false).unwrap().is_some());
    assert!(registry.query_api_service(false).unwrap().is_some());
    assert!(registry.session_api_service(false).unwrap().is_some());
    assert_eq!(registry.explanation_services(false).unwrap().len(), 2);
    assert_eq!(
        registry.provider_names(CapabilityKind::ExplanationGenerators),
        vec!["memory-proof-view", "memory-support-set"]
    );
    assert!(registry.validate().is_empty());
}

#[test]
fn test_repeated_lookups_share_one_instance() {
    let backend = MemoryBackend::new();
    let registry = discover(&backend, &RegistryConfig::default());

    let first = registry.session_api_service(false).unwrap().unwrap();
    let second = registry.session_api_service(false).unwrap().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_missing_session_provider() {
    init_tracing();
    let backend = MemoryBackend::new();
    let config = RegistryConfig::default().disable("memory-sessions");
    let registry = discover(&backend, &config);

    assert!(registry.session_api_service(true).unwrap().is_none());

    let err = registry.session_api_service(false).err().unwrap();
    assert_eq!(
        err.to_string(),
        "Could not find a service provider for SessionApiService"
    );

    // The other capabilities are unaffected
    assert!(registry.kb_api_service(false).unwrap().is_some());
}

#[test]
fn test_required_capability_checked_at_discovery() {
    let backend = MemoryBackend::new();
    let config = RegistryConfig::strict().disable("memory-sessions");
    let err = CapabilityRegistry::discover(&backend.providers(), &config).unwrap_err();
    assert!(matches!(
        err,
        RegistryError::ServiceBinding {
            capability: CapabilityKind::Sessions,
            found: 0
        }
    ));
}

#[test]
fn test_config_from_toml() {
    let config = RegistryConfig::from_toml_str(
        r#"
        disabled_providers = ["memory-support-set"]
        required = ["knowledge-objects"]
        "#,
    )
    .unwrap();
    let backend = MemoryBackend::new();
    let registry = discover(&backend, &config);

    assert_eq!(
        registry.provider_names(CapabilityKind::ExplanationGenerators),
        vec!["memory-proof-view"]
    );
}

#[test]
fn test_two_backends_make_single_valued_lookup_fail() {
    let mut catalog = MemoryBackend::new().providers();
    catalog.extend(MemoryBackend::new().providers());
    let registry = CapabilityRegistry::discover(&catalog, &RegistryConfig::default()).unwrap();

    let err = registry.kb_api_service(false).err().unwrap();
    assert_eq!(
        err.to_string(),
        "Expected one service provider for KbApiService but found 2"
    );
    // Explanation providers are multi-valued
    assert_eq!(registry.explanation_services(false).unwrap().len(), 4);
    assert_eq!(registry.validate().len(), 3);
}

#[test]
fn test_resolver_selects_by_kind_and_suitability() {
    let backend = MemoryBackend::new();
    let registry = discover(&backend, &RegistryConfig::default());
    let resolver = ServiceResolver::from_registry(&registry).unwrap();
    let answers = answers(&backend);

    let proven = &answers[0];
    let unproven = &answers[1];
    let proof_view = ExplanationSpec::proof_view();

    let provider = resolver.resolve(proven, Some(&proof_view)).unwrap();
    assert_eq!(provider.name(), "memory-proof-view");
    assert_eq!(provider.for_kind(), ExplanationKind::ProofView);

    assert!(matches!(
        resolver.resolve(unproven, Some(&proof_view)),
        Err(ResolveError::NoSuitableProvider { .. })
    ));

    let support = resolver
        .resolve(unproven, Some(&ExplanationSpec::support_set()))
        .unwrap();
    assert_eq!(support.name(), "memory-support-set");
}

#[test]
fn test_resolver_reports_duplicate_providers() {
    let backend = MemoryBackend::new();
    let mut catalog = backend.providers();
    catalog.extend(backend.providers());
    let registry = CapabilityRegistry::discover(&catalog, &RegistryConfig::default()).unwrap();
    let resolver = ServiceResolver::from_registry(&registry).unwrap();
    let answers = answers(&backend);

    let spec = ExplanationSpec::support_set();
    assert_eq!(
        resolver.conflicts(&answers[0], &spec),
        Some(vec![
            "memory-support-set".to_string(),
            "memory-support-set".to_string()
        ])
    );
    assert!(matches!(
        resolver.resolve(&answers[0], Some(&spec)),
        Err(ResolveError::Ambiguous { .. })
    ));
}

#[test]
fn test_resolver_rejects_untargeted_specification() {
    let backend = MemoryBackend::new();
    let registry = discover(&backend, &RegistryConfig::default());
    let resolver = ServiceResolver::from_registry(&registry).unwrap();
    let answers = answers(&backend);

    assert!(matches!(
        resolver.resolve(&answers[0], None),
        Err(ResolveError::MissingSpecification)
    ));
    assert!(matches!(
        resolver.resolve(&answers[0], Some(&ExplanationSpec::untargeted())),
        Err(ResolveError::MissingKind { .. })
    ));
    assert!(matches!(
        resolver.resolve(
            &answers[0],
            Some(&ExplanationSpec::new(ExplanationKind::Other("paraphrase".into())))
        ),
        Err(ResolveError::NoSuitableProvider { .. })
    ));
}

// The only test in this binary touching the process-wide registry
#[test]
fn test_global_install_is_final() {
    init_tracing();
    let backend = MemoryBackend::new();
    let installed = global::install(backend.providers(), RegistryConfig::strict()).unwrap();

    assert!(global::is_initialized());
    let again = global::global().unwrap();
    assert!(Arc::ptr_eq(&installed, &again));

    let err = global::install(MemoryBackend::new().providers(), RegistryConfig::default())
        .unwrap_err();
    assert!(matches!(err, RegistryError::AlreadyInitialized));
}
