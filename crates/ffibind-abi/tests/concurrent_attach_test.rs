//! Concurrent first binds of one key resolve exactly once.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use ffibind_abi::{
    BindError, Binder, BindingSpec, NativeSymbol, NativeValue, SymbolOrigin, SymbolResolver,
    SymbolTable, Value,
};

extern "C" fn twice(v: i32) -> i32 {
    v * 2
}

/// Slow resolver so that racing binders overlap inside resolution.
struct SlowResolver {
    calls: AtomicUsize,
}

impl SymbolResolver for SlowResolver {
    fn resolve(&self, _spec: &BindingSpec) -> Result<NativeSymbol, BindError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(20));
        Ok(NativeSymbol::new(twice as usize, SymbolOrigin::Injected))
    }
}

#[test]
fn racing_binds_resolve_once() {
    const THREADS: usize = 8;

    let resolver = Arc::new(SlowResolver {
        calls: AtomicUsize::new(0),
    });
    let binder = Binder::new(Arc::new(SymbolTable::new()), resolver.clone());
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let binder = binder.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let callable = binder.bind("Race", "Twice", "i", "i").unwrap();
                let out = unsafe { callable.call(&mut [Value::Int(i as i64)]) }.unwrap();
                assert_eq!(out, NativeValue::Int(2 * i as i32));
                callable.symbol().clone()
            })
        })
        .collect();

    let symbols: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(resolver.calls.load(Ordering::SeqCst), 1);
    assert!(symbols.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    assert_eq!(binder.table().len(), 1);
}

#[test]
fn callable_is_shareable_across_threads() {
    let resolver = Arc::new(SlowResolver {
        calls: AtomicUsize::new(0),
    });
    let binder = Binder::new(Arc::new(SymbolTable::new()), resolver);
    let callable = Arc::new(binder.bind("share", "Twice", "i", "i").unwrap());

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let callable = Arc::clone(&callable);
            thread::spawn(move || unsafe { callable.call(&mut [Value::Int(i)]) }.unwrap())
        })
        .collect();
    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), NativeValue::Int(2 * i as i32));
    }
}
