//! Insert, load and update cycles of a single record type.

use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

use tablet_db_core::config::DbConfig;
use tablet_db_core::{Database, DatabaseObject, Field, FieldType};

fn questionnaire() -> DatabaseObject {
    let mut object = DatabaseObject::new("bench_questionnaire");
    for i in 1..=9 {
        object.add_field(Field::new(format!("q{}", i), FieldType::Integer));
    }
    object.add_field(Field::new("comment", FieldType::Text));
    object
}

fn setup() -> Database {
    let db = Database::open_in_memory(&DbConfig::default()).unwrap();
    questionnaire().make_table(&db).unwrap();
    db
}

fn bench_insert(c: &mut Criterion) {
    let db = setup();
    c.bench_function("record_insert", |b| {
        b.iter(|| {
            let mut object = questionnaire();
            for i in 1..=9 {
                object.set_value(&format!("q{}", i), i as i64);
            }
            object.save(&db).unwrap();
            black_box(object.pk_value())
        })
    });
}

fn bench_load(c: &mut Criterion) {
    let db = setup();
    let mut object = questionnaire();
    object.set_value("q1", 1);
    object.save(&db).unwrap();
    let pk = object.pk_value().unwrap();

    c.bench_function("record_load", |b| {
        b.iter(|| {
            let mut object = questionnaire();
            black_box(object.load(&db, pk).unwrap())
        })
    });
}

fn bench_update(c: &mut Criterion) {
    let db = setup();
    let mut object = questionnaire();
    object.set_value("q1", 0);
    object.save(&db).unwrap();

    let mut n = 0i64;
    c.bench_function("record_update_one_field", |b| {
        b.iter(|| {
            n += 1;
            object.set_value("q1", n);
            object.save(&db).unwrap();
        })
    });
}

criterion_group!(benches, bench_insert, bench_load, bench_update);
criterion_main!(benches);
