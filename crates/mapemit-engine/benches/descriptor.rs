use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mapemit_engine::{MapRegistry, MemberMapperRequest};
use mapemit_sdk::{
    nullable_scalar, AttributeMetadataProvider, ClassBuilder, InitDataRef, PropertyDef,
    ScalarKind, TypeRef, Value,
};

fn scalar_record(properties: usize) -> TypeRef {
    let i64_ty = TypeRef::scalar(ScalarKind::I64);
    let mut builder = ClassBuilder::new(format!("Bench.Record{}", properties)).abstract_class();
    for i in 0..properties {
        builder = builder.property(PropertyDef::new(format!("P{}", i), &i64_ty).abstract_accessors());
    }
    builder.default_constructor().build().unwrap()
}

fn bench_synthesis(c: &mut Criterion) {
    let mut group = c.benchmark_group("synthesis");

    for properties in [1, 8, 32] {
        group.bench_with_input(
            BenchmarkId::new("scalar_properties", properties),
            &properties,
            |b, &properties| {
                let ty = scalar_record(properties);
                b.iter(|| {
                    let registry = MapRegistry::new(AttributeMetadataProvider);
                    registry.descriptor(black_box(&ty)).unwrap()
                });
            },
        );
    }

    group.finish();
}

fn bench_creation(c: &mut Criterion) {
    let registry = MapRegistry::new(AttributeMetadataProvider);
    let part = ClassBuilder::new("Bench.Part")
        .abstract_class()
        .constructor(vec![TypeRef::init_data()], |_, _| Ok(()))
        .build()
        .unwrap();
    let order = ClassBuilder::new("Bench.Order")
        .abstract_class()
        .property(
            PropertyDef::new("Part", &part)
                .abstract_accessors()
                .parameters(vec![Value::I32(1), Value::from("x")]),
        )
        .property(PropertyDef::new("Total", &TypeRef::scalar(ScalarKind::F64)).abstract_accessors())
        .build()
        .unwrap();
    let descriptor = registry.descriptor(&order).unwrap();

    c.bench_function("create_instance", |b| {
        b.iter(|| descriptor.create_instance().unwrap());
    });

    let init = InitDataRef::new();
    c.bench_function("create_instance_with", |b| {
        b.iter(|| descriptor.create_instance_with(black_box(&init)).unwrap());
    });

    c.bench_function("cached_descriptor", |b| {
        b.iter(|| registry.descriptor(black_box(&order)).unwrap());
    });
}

fn bench_member_mapper(c: &mut Criterion) {
    let registry = MapRegistry::new(AttributeMetadataProvider);
    let wrapper = nullable_scalar("Bench.SqlInt32", ScalarKind::I32, false).unwrap();
    let ty = ClassBuilder::new("Bench.Row")
        .abstract_class()
        .property(PropertyDef::new("Amount", &wrapper).abstract_accessors())
        .default_constructor()
        .build()
        .unwrap();
    let obj = registry.descriptor(&ty).unwrap().create_instance().unwrap();
    let mapper = registry
        .member_mapper(&MemberMapperRequest::property(&ty, "Amount"))
        .unwrap();

    let mut group = c.benchmark_group("member_mapper");
    group.bench_function("set_get_value", |b| {
        b.iter(|| {
            mapper.set_value(&obj, black_box(Value::I64(42))).unwrap();
            mapper.get_value(&obj).unwrap()
        });
    });
    group.bench_function("set_get_null", |b| {
        b.iter(|| {
            mapper.set_value(&obj, black_box(Value::Null)).unwrap();
            mapper.get_value(&obj).unwrap()
        });
    });
    group.finish();
}

criterion_group!(benches, bench_synthesis, bench_creation, bench_member_mapper);
criterion_main!(benches);
