//! Integration tests for the query lifecycle
//!
//! These tests drive the lifecycle manager against the in-memory backend,
//! from query construction through explanation and bulk teardown.

use ontic_domain::traits::{AssertionStore, StoredQuery};
use ontic_domain::{
    AnswerId, Argument, AssertionDraft, BackendError, ConstructionError, Context, Direction,
    Explanation, ExplanationSpec, InferenceParameters, KbTerm, ProofId, Sentence, TermKind,
    TerminationReason,
};
use ontic_memory::{InferenceScript, MemoryBackend, ScriptedAnswer};
use ontic_query::{
    lock_query, QueryConfig, QueryError, QueryLifecycleManager, QuerySpecification, QueryState,
    TermRef, TerminationPoller,
};
use ontic_registry::{global, CapabilityRegistry, RegistryConfig, RegistryError, ResolveError};
use std::time::Duration;

const DOGS: &str = "(#$isa ?X #$Dog)";

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn config() -> QueryConfig {
    QueryConfig {
        default_context: "BaseKB".to_string(),
        ..QueryConfig::default()
    }
}

fn manager_with(
    backend: &MemoryBackend,
    registry_config: &RegistryConfig,
) -> QueryLifecycleManager {
    let registry = CapabilityRegistry::discover(&backend.providers(), registry_config).unwrap();
    QueryLifecycleManager::from_registry(&registry, config()).unwrap()
}

fn setup() -> (MemoryBackend, QueryLifecycleManager) {
    init_tracing();
    let backend = MemoryBackend::new();
    let manager = manager_with(&backend, &RegistryConfig::strict());
    (backend, manager)
}

fn dogs_running(backend: &MemoryBackend) {
    backend.script(
        DOGS,
        InferenceScript::running()
            .with_answer(ScriptedAnswer::new().bind("?X", "Rex"))
            .with_answer(ScriptedAnswer::new().bind("?X", "Fido").unproven()),
    );
}

fn submitted(backend: &MemoryBackend) -> usize {
    backend
        .calls()
        .iter()
        .filter(|c| c.starts_with("submit"))
        .count()
}

#[test]
fn test_five_forms_normalize_to_same_request() {
    let (backend, manager) = setup();
    let stored = backend.define_query(
        "AllOfKind",
        StoredQuery {
            sentence: Sentence::parse("(#$isa ?X #$TheKind)").unwrap(),
            context: Context::new("BaseKB").unwrap(),
            parameters: InferenceParameters::new(),
        },
    );
    let base_kb = Context::new("BaseKB").unwrap();

    let specs = vec![
        QuerySpecification::text(DOGS),
        QuerySpecification::in_context(DOGS, "BaseKB"),
        QuerySpecification::with_parameters(DOGS, "#$BaseKB", ""),
        QuerySpecification::structured(Sentence::parse(DOGS).unwrap(), base_kb, None),
        QuerySpecification::stored(TermRef::Term(stored), [("#$TheKind", "#$Dog")]).unwrap(),
        QuerySpecification::stored(TermRef::Name("AllOfKind".to_string()), [("TheKind", "#$Dog")])
            .unwrap(),
    ];

    let mut requests = Vec::new();
    for spec in specs {
        let query = manager.query(spec).unwrap();
        let query = lock_query(&query);
        assert_eq!(query.state(), QueryState::NotStarted);
        requests.push(query.request().clone());
    }

    assert_eq!(requests[0].sentence.as_str(), DOGS);
    assert_eq!(requests[0].context.name(), "BaseKB");
    for request in &requests[1..] {
        assert_eq!(request, &requests[0]);
    }
    assert_eq!(manager.open_query_count(), 6);
    assert_eq!(manager.metrics().created["stored-term"], 2);
    assert_eq!(submitted(&backend), 0);
}

#[test]
fn test_parameters_layer_over_defaults() {
    init_tracing();
    let backend = MemoryBackend::new();
    let registry =
        CapabilityRegistry::discover(&backend.providers(), &RegistryConfig::default()).unwrap();
    let config = QueryConfig {
        default_parameters: ":max-number 100 :max-time 30".to_string(),
        ..QueryConfig::default()
    };
    let manager = QueryLifecycleManager::from_registry(&registry, config).unwrap();

    let query = manager
        .query_with_parameters(DOGS, "BaseKB", ":max-time 5 :max-transformation-depth 1")
        .unwrap();
    let query = lock_query(&query);
    assert_eq!(query.context().name(), "BaseKB");
    assert_eq!(query.parameters().len(), 3);
    assert_eq!(query.parameters().max_time(), Some(5));
}

#[test]
fn test_construction_errors_precede_remote_calls() {
    let (backend, manager) = setup();
    backend.add_term(KbTerm::new("Dog", TermKind::Collection));

    let err = manager.query_text("   ").unwrap_err();
    assert!(matches!(err, QueryError::Construction(ConstructionError::EmptyText)));

    let err = manager.query_text("(#$isa ?X #$Dog").unwrap_err();
    assert!(matches!(err, QueryError::Construction(ConstructionError::Unbalanced(_))));

    let err = manager.query_with_parameters(DOGS, "BaseKB", "max-time 5").unwrap_err();
    assert!(matches!(
        err,
        QueryError::Construction(ConstructionError::InvalidParameters { .. })
    ));

    let err = manager.query_in_context(DOGS, "PetsMt").unwrap_err();
    assert!(matches!(
        err,
        QueryError::Construction(ConstructionError::UnknownTerm(ref name)) if name == "PetsMt"
    ));

    let err = manager
        .query_stored(TermRef::Name("NoSuchQuery".to_string()), Vec::<(&str, &str)>::new())
        .unwrap_err();
    assert!(matches!(err, QueryError::Construction(ConstructionError::UnknownTerm(_))));

    let err = manager
        .query_stored(TermRef::Name("Dog".to_string()), Vec::<(&str, &str)>::new())
        .unwrap_err();
    assert!(matches!(
        err,
        QueryError::Construction(ConstructionError::NotAnIndividual {
            kind: TermKind::Collection,
            ..
        })
    ));

    let err = manager
        .query_stored(TermRef::Name("Dog".to_string()), [("?X", "#$Rex")])
        .unwrap_err();
    assert!(matches!(
        err,
        QueryError::Construction(ConstructionError::MalformedIndexical { .. })
    ));

    let err = manager
        .query_stored(
            TermRef::Name("Dog".to_string()),
            [("TheKind", "#$Dog"), ("#$TheKind", "#$Cat")],
        )
        .unwrap_err();
    assert!(matches!(
        err,
        QueryError::Construction(ConstructionError::AmbiguousIndexical { .. })
    ));

    assert_eq!(manager.open_query_count(), 0);
    assert_eq!(submitted(&backend), 0);
}

#[test]
fn test_missing_stored_query_specification() {
    let (backend, manager) = setup();
    backend.add_term(KbTerm::individual("Rex"));

    let err = manager
        .query_stored(TermRef::Name("Rex".to_string()), Vec::<(&str, &str)>::new())
        .unwrap_err();
    assert!(matches!(err, QueryError::Backend(BackendError::NotFound(_))));
}

#[test]
fn test_stored_query_without_query_provider() {
    init_tracing();
    let backend = MemoryBackend::new();
    let term = backend.define_query(
        "AllDogs",
        StoredQuery {
            sentence: Sentence::parse(DOGS).unwrap(),
            context: Context::new("BaseKB").unwrap(),
            parameters: InferenceParameters::new(),
        },
    );
    let manager = manager_with(
        &backend,
        &RegistryConfig::default().disable("memory-queries"),
    );

    // Other forms still work
    assert!(manager.query_text(DOGS).is_ok());

    let err = manager
        .query_stored(TermRef::Term(term), Vec::<(&str, &str)>::new())
        .unwrap_err();
    assert!(matches!(
        err,
        QueryError::Registry(RegistryError::ServiceBinding { .. })
    ));
    assert!(err.to_string().contains("QueryApiService"));
}

#[test]
fn test_manager_requires_session_provider() {
    init_tracing();
    let backend = MemoryBackend::new();
    let registry = CapabilityRegistry::discover(
        &backend.providers(),
        &RegistryConfig::default().disable("memory-sessions"),
    )
    .unwrap();

    let err = QueryLifecycleManager::from_registry(&registry, config()).unwrap_err();
    assert!(err
        .to_string()
        .contains("Could not find a service provider for SessionApiService"));
}

#[test]
fn test_query_runs_until_interrupted() {
    let (backend, manager) = setup();
    dogs_running(&backend);

    let query = manager.query_text(DOGS).unwrap();
    let mut query = lock_query(&query);

    assert!(matches!(query.poll_answers(), Err(QueryError::NotStarted(_))));
    let id = query.start().unwrap();
    assert_eq!(query.start().unwrap(), id);
    assert_eq!(submitted(&backend), 1);

    let answers = query.poll_answers().unwrap();
    assert_eq!(answers.len(), 2);
    assert_eq!(answers[0].binding("?X"), Some("Rex"));
    assert!(query.poll_answers().unwrap().is_empty());
    assert_eq!(query.poll().unwrap(), QueryState::Running);

    query.stop().unwrap();
    assert_eq!(query.state(), QueryState::InterruptRequested);
    assert_eq!(query.handle().unwrap().patience(), Some(5));
    assert_eq!(query.poll().unwrap(), QueryState::Terminated);
    assert_eq!(
        query.handle().unwrap().termination_reason(),
        Some(TerminationReason::Interrupted)
    );

    // Answers stay readable after termination
    assert_eq!(query.answers().len(), 2);

    query.close().unwrap();
    assert_eq!(query.state(), QueryState::Closed);
    assert!(backend.unreleased_inferences().is_empty());
    assert!(matches!(query.start(), Err(QueryError::Closed(_))));
}

#[test]
fn test_timeout_sent_as_max_time() {
    let (backend, manager) = setup();
    dogs_running(&backend);

    let default_timeout = manager.query_text(DOGS).unwrap();
    let explicit = manager
        .query_with_parameters(DOGS, "BaseKB", ":max-time 5")
        .unwrap();
    let short = manager.query_text(DOGS).unwrap();

    lock_query(&default_timeout).start().unwrap();
    lock_query(&explicit).start().unwrap();
    {
        let mut short = lock_query(&short);
        short.set_timeout(Some(Duration::from_secs(2)));
        short.start().unwrap();
    }

    backend.advance(2);
    assert_eq!(lock_query(&short).poll().unwrap(), QueryState::Terminated);
    assert_eq!(lock_query(&explicit).poll().unwrap(), QueryState::Running);

    backend.advance(3);
    assert_eq!(lock_query(&explicit).poll().unwrap(), QueryState::Terminated);
    assert_eq!(lock_query(&default_timeout).poll().unwrap(), QueryState::Running);

    backend.advance(55);
    assert_eq!(
        lock_query(&default_timeout).poll().unwrap(),
        QueryState::Terminated
    );
}

#[test]
fn test_sub_second_timeout_rounds_up() {
    let (backend, manager) = setup();
    dogs_running(&backend);

    let half = manager.query_text(DOGS).unwrap();
    let longer = manager.query_text(DOGS).unwrap();
    {
        let mut half = lock_query(&half);
        half.set_timeout(Some(Duration::from_millis(500)));
        half.start().unwrap();
    }
    {
        let mut longer = lock_query(&longer);
        longer.set_timeout(Some(Duration::from_millis(1500)));
        longer.start().unwrap();
    }

    assert_eq!(lock_query(&half).poll().unwrap(), QueryState::Running);

    backend.advance(1);
    assert_eq!(lock_query(&half).poll().unwrap(), QueryState::Terminated);
    assert_eq!(lock_query(&longer).poll().unwrap(), QueryState::Running);

    backend.advance(1);
    assert_eq!(lock_query(&longer).poll().unwrap(), QueryState::Terminated);
}

#[test]
fn test_forced_termination_after_patience() {
    let (backend, manager) = setup();
    backend.script(DOGS, InferenceScript::running().ignoring_interrupts());

    let query = manager.query_text(DOGS).unwrap();
    let mut query = lock_query(&query);
    query.start().unwrap();

    query.interrupt(Some(3)).unwrap();
    query.interrupt(Some(3)).unwrap();
    backend.advance(2);
    assert_eq!(query.poll().unwrap(), QueryState::InterruptRequested);

    backend.advance(1);
    assert_eq!(query.poll().unwrap(), QueryState::Terminated);
    assert_eq!(
        query.handle().unwrap().termination_reason(),
        Some(TerminationReason::Forced)
    );

    // Interrupting after termination is a no-op
    query.interrupt(Some(1)).unwrap();
}

#[test]
fn test_unbounded_patience_is_never_forced() {
    let (backend, manager) = setup();
    backend.script(DOGS, InferenceScript::running().ignoring_interrupts());

    let query = manager.query_with_parameters(DOGS, "BaseKB", ":max-time 100000").unwrap();
    let mut query = lock_query(&query);
    query.set_timeout(None);
    query.start().unwrap();
    query.interrupt(None).unwrap();

    backend.advance(1000);
    assert_eq!(query.poll().unwrap(), QueryState::InterruptRequested);
    query.close().unwrap();
}

#[test]
fn test_interrupt_then_close_never_fails() {
    let (backend, manager) = setup();
    backend.script(DOGS, InferenceScript::running().ignoring_interrupts());

    let query = manager.query_text(DOGS).unwrap();
    let mut query = lock_query(&query);
    query.start().unwrap();

    query.interrupt(Some(2)).unwrap();
    query.close().unwrap();
    query.close().unwrap();
    query.interrupt(Some(2)).unwrap();
    assert_eq!(query.state(), QueryState::Closed);
    assert!(backend.unreleased_inferences().is_empty());
}

#[test]
fn test_unreachable_interrupt_is_reported() {
    let (backend, manager) = setup();
    dogs_running(&backend);

    let query = manager.query_text(DOGS).unwrap();
    let mut query = lock_query(&query);
    query.start().unwrap();

    backend.set_reachable(false);
    let err = query.interrupt(Some(1)).unwrap_err();
    assert!(err.is_remote_unavailable());
    assert_eq!(query.state(), QueryState::Running);

    backend.set_reachable(true);
    query.interrupt(Some(1)).unwrap();
}

#[test]
fn test_first_proof_id_absent_until_materialized() {
    let (backend, manager) = setup();
    backend.script(
        DOGS,
        InferenceScript::running()
            .with_answer(ScriptedAnswer::new().bind("?X", "Rex").proof_after(5))
            .with_answer(ScriptedAnswer::new().bind("?X", "Fido").unproven()),
    );

    let query = manager.query_text(DOGS).unwrap();
    let mut query = lock_query(&query);
    query.start().unwrap();
    query.poll_answers().unwrap();

    assert_eq!(query.first_proof_id(AnswerId(0)).unwrap(), None);
    assert_eq!(query.first_proof_id(AnswerId(1)).unwrap(), None);

    backend.advance(5);
    assert_eq!(query.first_proof_id(AnswerId(0)).unwrap(), Some(ProofId(0)));
    assert_eq!(query.first_proof_id(AnswerId(1)).unwrap(), None);
}

#[test]
fn test_explanations_for_query_answers() {
    let (backend, manager) = setup();
    let fact = backend
        .assert_draft(AssertionDraft::fact(
            Sentence::parse("(#$isa #$Rex #$Dog)").unwrap(),
            Context::new("BaseKB").unwrap(),
        ))
        .unwrap();
    backend.script(
        DOGS,
        InferenceScript::running()
            .with_answer(
                ScriptedAnswer::new()
                    .bind("?X", "Rex")
                    .supported_by(fact.id())
                    .proof_after(1),
            )
            .with_answer(ScriptedAnswer::new().bind("?X", "Fido").unproven()),
    );

    let shared = manager.query_text(DOGS).unwrap();
    let answers = {
        let mut query = lock_query(&shared);
        query.start().unwrap();
        query.poll_answers().unwrap().to_vec()
    };
    let rex = &answers[0];
    let fido = &answers[1];
    assert_eq!(rex.proof, None);

    // Default proof-view spec, but no proof yet
    let err = manager.proof_view(rex, None).unwrap_err();
    assert!(matches!(
        err,
        QueryError::UnsupportedSpecification(ResolveError::NoSuitableProvider { .. })
    ));

    backend.advance(1);
    let spec = manager.proof_view_specification();
    let explanation = manager.explain_answer(&shared, rex, Some(&spec)).unwrap();
    let view = explanation.as_proof_view().unwrap();
    assert_eq!(view.proof, ProofId(0));
    assert_eq!(view.steps[1].assertion, Some(fact.id()));

    let with_proof = rex.clone().with_proof(ProofId(0));
    let mut generator = manager.proof_view_generator(&with_proof, None).unwrap();
    assert!(generator.explanation().is_none());
    generator.generate().unwrap();
    assert!(generator.explanation().is_some());

    let support = manager
        .explanation(fido, Some(&ExplanationSpec::support_set()))
        .unwrap();
    assert!(matches!(support, Explanation::SupportSet(ref set) if set.supports.is_empty()));

    let err = manager
        .proof_view_generator(&with_proof, Some(&ExplanationSpec::support_set()))
        .err()
        .unwrap();
    assert!(err.to_string().starts_with("Unsupported specification"));
}

#[test]
fn test_close_all_unclosed_queries() {
    let (backend, manager) = setup();
    dogs_running(&backend);

    let started: Vec<_> = (0..2).map(|_| manager.query_text(DOGS).unwrap()).collect();
    let idle = manager.query_text(DOGS).unwrap();
    for query in &started {
        lock_query(query).start().unwrap();
    }
    assert_eq!(backend.unreleased_inferences().len(), 2);

    let report = manager.close_all_unclosed_queries();
    assert_eq!(report.closed, 3);
    assert!(report.is_clean());
    assert_eq!(manager.open_query_count(), 0);
    assert!(backend.unreleased_inferences().is_empty());
    assert_eq!(lock_query(&idle).state(), QueryState::Closed);

    let metrics = manager.metrics();
    assert_eq!(metrics.closed, 3);
    assert_eq!(metrics.open(), 0);

    // Nothing left to close
    assert_eq!(manager.close_all_unclosed_queries().closed, 0);
}

#[test]
fn test_close_all_aggregates_failures() {
    let (backend, manager) = setup();
    dogs_running(&backend);

    let queries: Vec<_> = (0..3).map(|_| manager.query_text(DOGS).unwrap()).collect();
    lock_query(&queries[0]).start().unwrap();
    lock_query(&queries[1]).start().unwrap();

    backend.set_reachable(false);
    let report = manager.close_all_unclosed_queries();

    assert_eq!(report.closed, 3);
    assert_eq!(report.failures.len(), 2);
    assert!(report.failures.iter().all(|f| f.error.is_remote_unavailable()));
    assert_eq!(manager.open_query_count(), 0);
    for query in &queries {
        assert_eq!(lock_query(query).state(), QueryState::Closed);
    }
    assert_eq!(manager.metrics().close_failures, 2);
}

#[test]
fn test_close_after_session_closed_is_silent() {
    let (backend, manager) = setup();
    dogs_running(&backend);

    let query = manager.query_text(DOGS).unwrap();
    lock_query(&query).start().unwrap();
    backend.close_session();

    assert!(lock_query(&query).poll_answers().unwrap().is_empty());
    let report = manager.close_all_unclosed_queries();
    assert_eq!(report.closed, 1);
    assert!(report.is_clean());
}

#[test]
fn test_close_query_untracks() {
    let (backend, manager) = setup();
    dogs_running(&backend);

    let query = manager.query_text(DOGS).unwrap();
    let id = lock_query(&query).id();
    lock_query(&query).start().unwrap();

    assert!(manager.is_tracked(id));
    manager.close_query(id).unwrap();
    assert!(!manager.is_tracked(id));
    manager.close_query(id).unwrap();
    assert!(backend.unreleased_inferences().is_empty());
}

#[test]
fn test_poll_open_queries_releases_terminated() {
    let (backend, manager) = setup();
    backend.script(
        DOGS,
        InferenceScript::lasting(2).with_answer(ScriptedAnswer::new().bind("?X", "Rex")),
    );
    backend.script("(#$isa ?X #$Cat)", InferenceScript::running());

    let dogs = manager.query_text(DOGS).unwrap();
    let cats = manager.query_text("(#$isa ?X #$Cat)").unwrap();
    let idle = manager.query_text(DOGS).unwrap();
    lock_query(&dogs).start().unwrap();
    lock_query(&cats).start().unwrap();

    let summary = manager.poll_open_queries();
    assert_eq!(summary.polled, 2);
    assert_eq!(summary.answers, 1);
    assert_eq!(summary.terminated, 0);

    backend.advance(2);
    let summary = manager.poll_open_queries();
    assert_eq!(summary.terminated, 1);
    assert!(summary.failures.is_empty());
    assert_eq!(manager.open_query_count(), 2);

    let dogs = lock_query(&dogs);
    assert_eq!(dogs.state(), QueryState::Closed);
    assert_eq!(dogs.answers().len(), 1);
    assert_eq!(lock_query(&idle).state(), QueryState::NotStarted);
    assert_eq!(manager.metrics().terminations_observed, 1);
}

#[test]
fn test_poll_keeps_terminated_query_when_answers_unreachable() {
    let (backend, manager) = setup();
    backend.script(
        DOGS,
        InferenceScript::lasting(1).with_answer(ScriptedAnswer::new().bind("?X", "Rex")),
    );

    let query = manager.query_text(DOGS).unwrap();
    let id = lock_query(&query).id();
    lock_query(&query).start().unwrap();
    backend.advance(1);
    assert_eq!(lock_query(&query).poll().unwrap(), QueryState::Terminated);

    backend.set_reachable(false);
    let summary = manager.poll_open_queries();
    assert_eq!(summary.terminated, 0);
    assert_eq!(summary.failures.len(), 1);
    assert!(summary.failures[0].error.is_remote_unavailable());
    assert!(manager.is_tracked(id));
    assert_eq!(lock_query(&query).state(), QueryState::Terminated);

    backend.set_reachable(true);
    let summary = manager.poll_open_queries();
    assert_eq!(summary.terminated, 1);
    assert_eq!(summary.answers, 1);
    assert!(!manager.is_tracked(id));

    let query = lock_query(&query);
    assert_eq!(query.state(), QueryState::Closed);
    assert_eq!(query.answers()[0].binding("?X"), Some("Rex"));
    assert_eq!(manager.metrics().terminations_observed, 1);
}

#[test]
fn test_deletion_through_kb_capability() {
    let (backend, manager) = setup();
    let kb = manager.kb();
    let context = Context::new("BaseKB").unwrap();

    let asserted = kb
        .assert_draft(AssertionDraft::fact(
            Sentence::parse("(#$isa #$Rex #$Dog)").unwrap(),
            context.clone(),
        ))
        .unwrap();
    assert!(asserted.supporting_assertion_ids().is_empty());
    kb.delete_assertion(asserted.id()).unwrap();

    let deduced = backend.insert_assertion(
        AssertionDraft::fact(Sentence::parse("(#$isa #$Rex #$Animal)").unwrap(), context)
            .resolve(),
        vec![Argument::Deduction {
            direction: Direction::Forward,
            supports: vec![],
        }],
    );
    let err = kb.delete_assertion(deduced.id()).unwrap_err();
    assert!(matches!(err, BackendError::DeletionRefused { .. }));
    assert!(kb.find_assertion(deduced.id()).unwrap().is_some());
}

#[tokio::test]
async fn test_poller_run_cycles() {
    let (backend, manager) = setup();
    backend.script(DOGS, InferenceScript::lasting(1));

    let query = manager.query_text(DOGS).unwrap();
    lock_query(&query).start().unwrap();

    let mut poller =
        TerminationPoller::new(manager.clone()).with_interval(Duration::from_millis(1));
    let first = poller.run_cycles(1).await;
    assert_eq!(first[0].terminated, 0);

    backend.advance(1);
    let summaries = poller.run_cycles(2).await;
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].terminated, 1);
    assert_eq!(summaries[1].polled, 0);

    assert_eq!(poller.metrics().poll_cycles, 3);
    assert_eq!(manager.open_query_count(), 0);

    poller.reset_metrics();
    assert_eq!(poller.metrics().poll_cycles, 0);
}

#[tokio::test]
async fn test_poller_stops_on_shutdown() {
    let (_backend, manager) = setup();
    let mut poller = TerminationPoller::new(manager).with_interval(Duration::from_millis(5));

    poller
        .run(async {
            tokio::time::sleep(Duration::from_millis(30)).await;
        })
        .await;

    // The first tick fires immediately
    assert!(poller.metrics().poll_cycles >= 1);
}

// The only test in this binary touching the process-wide registry
#[test]
fn test_manager_from_global_registry() {
    init_tracing();
    global::reset();
    let backend = MemoryBackend::new();
    dogs_running(&backend);
    global::install(backend.providers(), RegistryConfig::strict()).unwrap();

    let manager = QueryLifecycleManager::from_global(config()).unwrap();
    let query = manager.query_text(DOGS).unwrap();
    lock_query(&query).start().unwrap();

    assert_eq!(manager.close_all_unclosed_queries().closed, 1);
    global::reset();
}
