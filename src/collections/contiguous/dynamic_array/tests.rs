#![cfg(test)]

use std::hash::{BuildHasher, RandomState};
use std::rc::Rc;

use proptest::prelude::*;

use super::*;
use crate::collections::traits::TryClone;
use crate::util::alloc::{CopyRefused, CountedDrop, Flaky, FlakyState};
use crate::util::error::{IndexOutOfBounds, MutationError};
use crate::util::panic::assert_panics;
use crate::util::result::ResultExtension;

fn flaky_array(state: &Rc<FlakyState>, values: &[u32]) -> DynamicArray<Flaky> {
    let mut arr = DynamicArray::new();
    for &value in values {
        arr.push_back(&Flaky::new(value, state)).throw();
    }
    arr
}

fn flaky_values(arr: &DynamicArray<Flaky>) -> Vec<u32> {
    arr.data().iter().map(|f| f.value).collect()
}

#[test]
fn test_constructor_empty() {
    let arr = DynamicArray::<i32>::new();
    assert!(arr.is_empty());
    assert_eq!(arr.len(), 0);
    assert_eq!(arr.cap(), 0);
    assert!(!arr.slots.is_allocated(), "An empty DynamicArray shouldn't allocate.");

    let arr = DynamicArray::<i32>::from_slice(&[]).throw();
    assert!(arr.is_empty());
    assert_eq!(arr.cap(), 0);
    assert!(!arr.slots.is_allocated(), "An empty slice shouldn't allocate.");
}

#[test]
fn test_constructor_from_slice() {
    let arr = DynamicArray::from_slice(&[3, 2, 1]).throw();

    assert_eq!(arr.len(), 3);
    assert_eq!(arr.cap(), 3, "Capacity should exactly match the provided slice.");
    assert_eq!(arr.at(0), Ok(&3));
    assert_eq!(arr.at(1), Ok(&2));
    assert_eq!(arr.at(2), Ok(&1));

    let arr = DynamicArray::<&str>::try_from(["a", "b"].as_slice()).throw();
    assert_eq!(arr.data(), &["a", "b"]);
}

#[test]
fn test_insert() {
    let mut arr = DynamicArray::new();
    arr.insert(0, &10).throw();
    assert_eq!(arr.len(), 1);
    assert_eq!(arr.cap(), 1);
    assert_eq!(arr.at(0), Ok(&10));

    let cases: [(usize, [i32; 5]); 4] = [
        (0, [0, 10, 10, 10, 10]),
        (2, [10, 10, 0, 10, 10]),
        (3, [10, 10, 10, 0, 10]),
        (4, [10, 10, 10, 10, 0]),
    ];

    for (index, expected) in cases {
        let mut arr = DynamicArray::from_slice(&[10, 10, 10, 10]).throw();
        arr.insert(index, &0).throw();
        assert_eq!(arr.data(), &expected, "Inserting at {index} should shift the tail up.");
        assert_eq!(arr.cap(), 9, "A full DynamicArray should grow to 2 * cap + 1.");
    }

    let mut arr = DynamicArray::from_slice(&[10, 10, 10, 10]).throw();
    assert_eq!(
        arr.insert(5, &0),
        Err(MutationError::IndexOutOfBounds(IndexOutOfBounds { index: 5, len: 4 })),
        "Inserting past len should be rejected."
    );
    assert_eq!(arr.data(), &[10, 10, 10, 10]);
    assert_eq!(arr.cap(), 4);
}

#[test]
fn test_erase() {
    let mut arr = DynamicArray::from_slice(&[1]).throw();
    arr.erase(0).throw();
    assert!(arr.is_empty());
    assert_eq!(arr.cap(), 1, "Erasing shouldn't release capacity.");

    let cases: [(usize, [i32; 3]); 3] = [
        (0, [2, 3, 4]),
        (1, [1, 3, 4]),
        (3, [1, 2, 3]),
    ];

    for (index, expected) in cases {
        let mut arr = DynamicArray::from_slice(&[1, 2, 3, 4]).throw();
        arr.erase(index).throw();
        assert_eq!(arr.data(), &expected, "Erasing at {index} should shift the tail down.");
        assert_eq!(arr.cap(), 4, "Erasing shouldn't change the capacity.");
    }

    let mut arr = DynamicArray::from_slice(&[1, 2, 3, 4]).throw();
    assert!(arr.erase(4).is_err_and(|e| e.is_index_out_of_bounds()));
    assert_eq!(arr.data(), &[1, 2, 3, 4]);

    let mut arr = DynamicArray::<i32>::new();
    assert!(arr.erase(0).is_err_and(|e| e.is_index_out_of_bounds()));
    assert_eq!(arr.pop_back(), Err(IndexOutOfBounds { index: 0, len: 0 }));
    assert_eq!(arr.cap(), 0);
}

#[test]
fn test_growth_law() {
    let mut arr = DynamicArray::new();
    let mut caps = [0; 5];
    let mut grown = 0;

    for i in 0..31_u32 {
        let old_cap = arr.cap();
        arr.push_back(&i).throw();

        if arr.cap() != old_cap {
            assert_eq!(old_cap, arr.len() - 1, "Should only grow when full.");
            caps[grown] = arr.cap();
            grown += 1;
        }
    }

    assert_eq!(caps, [1, 3, 7, 15, 31]);
    assert_eq!(arr.len(), 31);
}

#[test]
fn test_regular_use() {
    let mut arr = DynamicArray::new();
    assert!(arr.is_empty());

    for _ in 0..2 {
        for j in 0..4_usize {
            arr.push_back(&j).throw();
        }
        assert_eq!(arr.len(), 4);
        assert_eq!(arr.data(), &[0, 1, 2, 3]);

        for j in (0..4).rev() {
            assert_eq!(arr.pop_back(), Ok(j));
        }
        assert!(arr.is_empty());
        assert_eq!(arr.cap(), 7, "Popping shouldn't release capacity.");
    }
}

#[test]
fn test_access() {
    let mut arr = DynamicArray::from_slice(&[5, 6, 7]).throw();

    assert_eq!(arr[1], 6);
    arr[1] = 60;
    *arr.at_mut(2).throw() += 1;
    arr.data_mut()[0] = 50;
    assert_eq!(arr.data(), &[50, 60, 8]);

    // SAFETY: 2 < len.
    assert_eq!(unsafe { *arr.at_unchecked(2) }, 8);

    assert_eq!(arr.at(3), Err(IndexOutOfBounds { index: 3, len: 3 }));
    assert!(arr.at_mut(3).is_err());
    assert_panics!({ arr[3] });
}

#[test]
fn test_insert_copy_failure_is_atomic() {
    // The replacement is filled in order: the head, the new value, then the tail.
    let copy_order = [1, 2, 9, 3, 4];

    for grows in [true, false] {
        for budget in 0..copy_order.len() {
            let state = FlakyState::new();
            let mut arr = if grows {
                DynamicArray::from_slice(&[
                    Flaky::new(1, &state),
                    Flaky::new(2, &state),
                    Flaky::new(3, &state),
                    Flaky::new(4, &state),
                ]).throw()
            } else {
                flaky_array(&state, &[1, 2, 3, 4])
            };
            let cap = arr.cap();
            let value = Flaky::new(9, &state);
            let live = state.live();

            state.fail_after(budget);
            assert_eq!(
                arr.insert(2, &value).map_err(MutationError::into_copy),
                Err(Some(CopyRefused { value: copy_order[budget] })),
                "Copy number {budget} should have failed."
            );
            state.disarm();

            assert_eq!(flaky_values(&arr), [1, 2, 3, 4], "Elements shouldn't change.");
            assert_eq!(arr.len(), 4);
            assert_eq!(arr.cap(), cap, "Capacity shouldn't change.");
            assert_eq!(state.live(), live, "All partial copies should have been dropped.");
        }
    }

    let state = FlakyState::new();
    let mut arr = flaky_array(&state, &[1, 2, 3, 4]);
    state.fail_after(5);
    arr.insert(2, &Flaky::new(9, &state)).throw();
    assert_eq!(flaky_values(&arr), [1, 2, 9, 3, 4]);

    drop(arr);
    assert_eq!(state.live(), 0, "Dropping should release every element.");
}

#[test]
fn test_erase_copy_failure_is_atomic() {
    let copy_order = [1, 3, 4];

    for budget in 0..copy_order.len() {
        let state = FlakyState::new();
        let mut arr = flaky_array(&state, &[1, 2, 3, 4]);
        let live = state.live();

        state.fail_after(budget);
        assert_eq!(
            arr.erase(1).map_err(MutationError::into_copy),
            Err(Some(CopyRefused { value: copy_order[budget] })),
        );
        state.disarm();

        assert_eq!(flaky_values(&arr), [1, 2, 3, 4]);
        assert_eq!(arr.cap(), 7);
        assert_eq!(state.live(), live, "All partial copies should have been dropped.");
    }

    let state = FlakyState::new();
    let mut arr = flaky_array(&state, &[1, 2, 3, 4]);
    state.fail_after(0);
    arr.erase(3).throw();
    assert_eq!(flaky_values(&arr), [1, 2, 3], "Erasing the last element shouldn't copy.");
    assert_eq!(state.live(), 3);
}

#[test]
fn test_construction_failure_releases_copies() {
    let state = FlakyState::new();
    let source = [Flaky::new(1, &state), Flaky::new(2, &state), Flaky::new(3, &state)];

    state.fail_after(2);
    assert_eq!(
        DynamicArray::from_slice(&source).map_err(MutationError::into_copy),
        Err(Some(CopyRefused { value: 3 })),
    );
    assert_eq!(state.live(), 3, "Only the source values should remain.");
    state.disarm();

    let arr = flaky_array(&state, &[1, 2]);
    state.fail_after(1);
    assert!(arr.try_clone().is_err_and(|e| e.is_copy()));
    assert_eq!(state.live(), 5);
}

#[test]
fn test_panicking_copy_is_atomic() {
    let state = FlakyState::new();
    let mut arr = flaky_array(&state, &[1, 2, 3, 4]);
    let value = Flaky::new(9, &state);
    let live = state.live();

    state.panic_after(3);
    assert_panics!({
        let _ = arr.insert(1, &value);
    });
    state.panic_after(1);
    assert_panics!({
        let _ = arr.erase(0);
    });
    state.disarm();

    assert_eq!(flaky_values(&arr), [1, 2, 3, 4]);
    assert_eq!(arr.cap(), 7);
    assert_eq!(state.live(), live, "Copies made before the panic should have been dropped.");
}

#[test]
fn test_drop() {
    let counter = CountedDrop::new(0);
    let source = [counter.clone(), counter.clone(), counter.clone(), counter.clone()];
    let mut arr = DynamicArray::from_slice(&source).throw();
    assert_eq!(counter.take(), 0, "Copying shouldn't drop anything.");

    arr.erase(3).throw();
    assert_eq!(counter.take(), 1, "Erasing the last element should drop only it.");

    arr.erase(0).throw();
    assert_eq!(
        counter.take(),
        3,
        "Rebuilding should drop every element of the old buffer."
    );

    arr.clear();
    assert_eq!(counter.take(), 2, "Clearing should drop every element.");
    assert_eq!(arr.cap(), 4, "Clearing should keep the capacity.");

    arr.push_back(&counter).throw();
    drop(arr);
    assert_eq!(counter.take(), 1, "Dropping should drop every element.");
}

#[test]
fn test_zst_support() {
    let mut arr = DynamicArray::<()>::new();

    for _ in 0..10 {
        arr.push_back(&()).throw();
    }

    assert_eq!(arr.len(), 10);
    assert_eq!(arr.cap(), 15, "Capacity should follow the same growth law for ZSTs.");
    assert!(!arr.slots.is_allocated(), "ZSTs should never allocate.");

    arr.erase(4).throw();
    assert_eq!(arr.len(), 9);
}

#[test]
fn test_buffer_errors() {
    assert!(
        DynamicArray::<u64>::with_cap(usize::MAX).is_err_and(|e| e.is_capacity_overflow()),
        "A layout larger than isize::MAX should be rejected."
    );
    assert!(
        DynamicArray::<u8>::with_cap(isize::MAX as usize).is_err_and(|e| e.is_alloc()),
        "An unsatisfiable allocation should be reported, not abort."
    );

    let arr = DynamicArray::<u64>::with_cap(3).throw();
    assert!(arr.slots.is_allocated());
    assert_eq!(arr.cap(), 3);
    assert!(arr.is_empty());
}

#[test]
fn test_growth_overflow_is_atomic() {
    // Zero-sized elements never allocate, so a full array at usize::MAX can be faked cheaply.
    let mut arr = DynamicArray::<()>::with_cap(usize::MAX).throw();
    arr.len = usize::MAX;

    assert!(
        arr.push_back(&()).is_err_and(|e| e.is_capacity_overflow()),
        "Growing past usize::MAX should report a capacity overflow."
    );
    assert_eq!(arr.len(), usize::MAX, "A failed push_back shouldn't change the length.");
    assert_eq!(arr.cap(), usize::MAX, "A failed push_back shouldn't change the capacity.");

    assert!(
        arr.insert(0, &()).is_err_and(|e| e.is_capacity_overflow()),
        "Growing past usize::MAX should report a capacity overflow."
    );
    assert_eq!(arr.len(), usize::MAX, "A failed insert shouldn't change the length.");
    assert_eq!(arr.cap(), usize::MAX, "A failed insert shouldn't change the capacity.");

    arr.len = 0;
}

#[test]
fn test_deep_copy() {
    let arr = DynamicArray::from_slice(&[String::from("a"), String::from("b")]).throw();

    let copied = arr.try_clone().throw();
    assert_eq!(copied, arr);
    assert_eq!(copied.cap(), arr.cap());
    assert_ne!(copied.slots.as_ptr(), arr.slots.as_ptr(), "Copies should never share a buffer.");

    let mut cloned = arr.clone();
    cloned[0].push('!');
    assert_eq!(cloned.data(), &["a!", "b"]);
    assert_eq!(arr.data(), &["a", "b"], "Mutating a clone shouldn't affect the original.");
}

#[test]
fn test_equality_and_hash() {
    let arr = DynamicArray::from_slice(&[0_usize, 1, 2]).throw();

    let mut pushed = DynamicArray::new();
    for i in 0..3_usize {
        pushed.push_back(&i).throw();
    }

    assert_eq!(arr, pushed, "Equality shouldn't depend on capacity.");
    assert_ne!(arr, DynamicArray::from_slice(&[0, 1, 3]).throw());

    let state = RandomState::new();
    assert_eq!(
        state.hash_one(&arr),
        state.hash_one(&pushed),
        "Equal DynamicArrays should produce the same hash."
    );
    assert_eq!(
        state.hash_one(&arr),
        state.hash_one([0_usize, 1, 2].as_slice()),
        "Hash should match the contained slice."
    );

    assert_eq!(format!("{arr}"), "[0, 1, 2]");
    assert_eq!(format!("{arr:?}"), "DynamicArray { contents: [0, 1, 2], len: 3, cap: 3 }");
}

#[derive(Debug, Clone)]
enum Op {
    PushBack(u8),
    PopBack,
    Insert(usize, u8),
    Erase(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        any::<u8>().prop_map(Op::PushBack),
        Just(Op::PopBack),
        (any::<usize>(), any::<u8>()).prop_map(|(i, v)| Op::Insert(i, v)),
        any::<usize>().prop_map(Op::Erase),
    ]
}

proptest! {
    #[test]
    fn prop_matches_vec_model(ops in prop::collection::vec(op_strategy(), 0..64)) {
        let mut arr: DynamicArray<u8> = DynamicArray::new();
        let mut model: Vec<u8> = Vec::new();
        let mut allocated = false;

        for op in ops {
            let old_cap = arr.cap();

            match op {
                Op::PushBack(value) => {
                    prop_assert!(arr.push_back(&value).is_ok());
                    model.push(value);
                    allocated = true;
                },
                Op::PopBack => {
                    prop_assert_eq!(arr.pop_back().ok(), model.pop());
                },
                Op::Insert(index, value) => {
                    // Occasionally one past the end, to exercise the bounds check.
                    let index = index % (model.len() + 2);
                    let result = arr.insert(index, &value);

                    if index <= model.len() {
                        prop_assert!(result.is_ok());
                        model.insert(index, value);
                        allocated = true;
                    } else {
                        prop_assert!(result.is_err_and(|e| e.is_index_out_of_bounds()));
                    }
                },
                Op::Erase(index) => {
                    let index = index % (model.len() + 1);
                    let result = arr.erase(index);

                    if index < model.len() {
                        prop_assert!(result.is_ok());
                        model.remove(index);
                    } else {
                        prop_assert!(result.is_err_and(|e| e.is_index_out_of_bounds()));
                    }
                },
            }

            prop_assert!(arr.len() <= arr.cap());
            prop_assert_eq!(arr.cap() == 0, !allocated);
            prop_assert!(
                arr.cap() == old_cap || arr.cap() == old_cap * 2 + 1,
                "Capacity should only ever stay the same or grow to 2 * cap + 1."
            );
            prop_assert_eq!(arr.data(), model.as_slice());
        }
    }
}
