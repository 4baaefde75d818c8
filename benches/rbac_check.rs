use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rbac_guard::iam::{AuthorizationEngine, PatternMatcher, Policy, Statement};
use rbac_guard::request::{AuthorizationRequest, FieldDescriptor, RequestSchema, Session};
use rbac_guard::InMemoryPolicyStore;

/// Engine with an operator policy, guard rails and a protected volume
fn create_engine(extra_statements: usize) -> AuthorizationEngine<InMemoryPolicyStore> {
    let mut operator = Policy::new("operator")
        .statement(Statement::allow(&["vm.*", "volume.*", "image.query*"]).unwrap());

    // Filler statements that never match
    for i in 0..extra_statements {
        let action = format!("service{}.operation", i);
        operator.add_statement(Statement::allow(&[action.as_str()]).unwrap());
    }

    let policies = vec![
        operator,
        Policy::new("guard-rails")
            .statement(Statement::deny(&["vm.create:rootVolumeUuid", "image.delete"]).unwrap()),
        Policy::new("protect-db").statement(
            Statement::deny(&["volume.delete"])
                .unwrap()
                .with_target_resources(&["Volume:vol-db"])
                .unwrap(),
        ),
    ];

    let store = InMemoryPolicyStore::new();
    for policy in policies {
        let uuid = policy.uuid.clone();
        store.insert_policy(policy);
        store.attach_global(&uuid);
    }
    AuthorizationEngine::new(store)
}

fn vm_create_request() -> AuthorizationRequest {
    let schema = RequestSchema::new("vm.create")
        .field(FieldDescriptor::resource("rootVolumeUuid", "Volume"))
        .field(FieldDescriptor::resource_list("dataVolumeUuids", "Volume"))
        .build();
    AuthorizationRequest::new(schema, Session::account("acct-1"))
        .set("dataVolumeUuids", vec!["vol-1", "vol-2", "vol-3"])
}

/// Benchmark single decisions (hot path)
fn bench_check(c: &mut Criterion) {
    let counts = vec![100, 1_000, 10_000];

    let mut group = c.benchmark_group("check");

    for count in counts {
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let engine = create_engine(0);
            let request = vm_create_request();

            b.iter(|| {
                for _ in 0..count {
                    black_box(engine.check(&request).is_ok());
                }
            });
        });
    }

    group.finish();
}

/// Benchmark statement count scaling
fn bench_policy_complexity(c: &mut Criterion) {
    let statement_counts = vec![5, 25, 100];

    let mut group = c.benchmark_group("policy_complexity");

    for count in statement_counts {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let engine = create_engine(count);
            let request = vm_create_request();

            b.iter(|| black_box(engine.check(&request).is_ok()));
        });
    }

    group.finish();
}

/// Benchmark bulk capability listing
fn bench_evaluate_permissions(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate_permissions");

    let ops: Vec<String> = (0..200)
        .map(|i| match i % 4 {
            0 => format!("vm.op{}", i),
            1 => format!("volume.op{}", i),
            2 => format!("image.query{}", i),
            _ => format!("zone.op{}", i),
        })
        .collect();

    group.throughput(Throughput::Elements(ops.len() as u64));
    group.bench_function("200_operations", |b| {
        let engine = create_engine(25);
        let session = Session::account("acct-1");

        b.iter(|| black_box(engine.evaluate_permissions(&ops, &session)));
    });

    group.finish();
}

/// Benchmark wildcard pattern matching performance
fn bench_wildcard_matching(c: &mut Criterion) {
    let mut group = c.benchmark_group("wildcard_matching");

    group.bench_function("trailing_wildcard", |b| {
        b.iter(|| {
            for i in 0..100 {
                let candidate = format!("vm.create.disk{}", i);
                black_box(PatternMatcher::matches("vm.create.*", &candidate));
            }
        });
    });

    group.bench_function("inner_wildcard", |b| {
        b.iter(|| {
            for i in 0..100 {
                let candidate = format!("vm.op{}.disk", i);
                black_box(PatternMatcher::matches("vm.*.disk", &candidate));
            }
        });
    });

    group.bench_function("principal_prefix", |b| {
        let ids: Vec<String> = (0..100)
            .map(|_| format!("{:08x}-aaaa", rand::random::<u32>()))
            .collect();

        b.iter(|| {
            for id in &ids {
                black_box(PatternMatcher::matches("11111111-*", id));
            }
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_check,
    bench_policy_complexity,
    bench_evaluate_permissions,
    bench_wildcard_matching
);
criterion_main!(benches);
