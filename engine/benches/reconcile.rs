use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use engine::{EngineConfig, Host, StateListener, StateManager};
use fields::{EquipSlot, MetaIndex};
use sim::{armor, display, human_sample, SimCatalog, SimHost};
use state::{ActorId, EditContext, StainId};

fn tracked_world(actors: u64) -> (StateManager<SimCatalog>, SimHost) {
    let mut host = SimHost::new();
    let config = EngineConfig {
        max_actors: actors as usize,
        ..EngineConfig::default()
    };
    let mut manager = StateManager::new(config, SimCatalog::new());
    for id in 0..actors {
        let actor = ActorId::new(id);
        host.spawn(actor, human_sample());
        manager.get_or_create(&host, actor).expect("track actor");
        manager
            .change_stain(&mut host, actor, EquipSlot::Body, StainId(9), EditContext::manual())
            .expect("stain edit");
        manager
            .change_meta(&mut host, actor, MetaIndex::Wetness, true, EditContext::fixed())
            .expect("meta edit");
    }
    host.take_effects();
    (manager, host)
}

fn bench_display_pass(c: &mut Criterion) {
    let (mut manager, mut host) = tracked_world(1);
    let mut listener = StateListener::new();
    let object = host.objects(ActorId::new(0))[0];
    let proposed = host.sample(object).expect("sample");

    c.bench_function("display_pass_no_change", |b| {
        b.iter(|| {
            display(&mut manager, &mut listener, &mut host, object, black_box(&proposed));
        });
    });
}

fn bench_host_change(c: &mut Criterion) {
    c.bench_function("display_pass_host_change", |b| {
        b.iter_batched(
            || {
                let (manager, mut host) = tracked_world(1);
                let object = host.objects(ActorId::new(0))[0];
                if let Some(o) = host.object_mut(object) {
                    o.record.armor[EquipSlot::Legs.index()] = armor(40, 2);
                }
                let proposed = host.sample(object).expect("sample");
                (manager, host, object, proposed)
            },
            |(mut manager, mut host, object, proposed)| {
                let mut listener = StateListener::new();
                display(&mut manager, &mut listener, &mut host, object, &proposed);
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_many_actors(c: &mut Criterion) {
    let (mut manager, mut host) = tracked_world(64);
    let mut listener = StateListener::new();
    let passes: Vec<_> = (0..64)
        .map(|id| {
            let object = host.objects(ActorId::new(id))[0];
            (object, host.sample(object).expect("sample"))
        })
        .collect();

    c.bench_function("display_pass_64_actors", |b| {
        b.iter(|| {
            for (object, proposed) in &passes {
                display(&mut manager, &mut listener, &mut host, *object, proposed);
            }
        });
    });
}

criterion_group!(benches, bench_display_pass, bench_host_change, bench_many_actors);
criterion_main!(benches);
