//! Property-based tests for the attachment lifecycle.
//!
//! For any sequence of add/remove/clear operations the live count never
//! exceeds the cap, and after teardown every preview that was ever
//! registered has been released exactly once.

use cookroom_images::{AttachmentManager, ImageConfig, ImageError, PreviewRegistry, SelectedFile};
use proptest::prelude::*;

const PNG: &[u8] = &[0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a];

#[derive(Debug, Clone)]
enum Op {
    Add { images: usize, junk: usize },
    Remove(usize),
    RemoveUnknown,
    Clear,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0usize..5, 0usize..3).prop_map(|(images, junk)| Op::Add { images, junk }),
        3 => (0usize..4).prop_map(Op::Remove),
        1 => Just(Op::RemoveUnknown),
        1 => Just(Op::Clear),
    ]
}

fn batch(images: usize, junk: usize) -> Vec<SelectedFile> {
    let mut files: Vec<SelectedFile> = (0..images)
        .map(|i| SelectedFile::new(format!("img-{i}.png"), PNG.to_vec()))
        .collect();
    files.extend((0..junk).map(|i| SelectedFile::new(format!("doc-{i}.txt"), b"text".to_vec())));
    files
}

/// Attachment count stays within the cap and previews are released exactly once
#[test]
fn prop_count_bounded_and_previews_released_once() {
    proptest!(|(ops in prop::collection::vec(op_strategy(), 1..40))| {
        let registry = PreviewRegistry::new();
        let mut manager = AttachmentManager::new(ImageConfig::default(), registry.clone());

        for op in ops {
            match op {
                Op::Add { images, junk } => {
                    let before = manager.len();
                    match manager.add(batch(images, junk)) {
                        Ok(outcome) => {
                            prop_assert_eq!(outcome.admitted.len(), images);
                            prop_assert_eq!(outcome.skipped.len(), junk);
                            prop_assert_eq!(manager.len(), before + images);
                        }
                        Err(ImageError::LimitExceeded { current, incoming, max }) => {
                            prop_assert_eq!(current, before);
                            prop_assert_eq!(incoming, images);
                            prop_assert!(current + incoming > max);
                            prop_assert_eq!(manager.len(), before);
                        }
                        Err(other) => prop_assert!(false, "unexpected error: {}", other),
                    }
                }
                Op::Remove(index) => {
                    let id = manager.attachments().get(index).map(|a| a.id());
                    if let Some(id) = id {
                        prop_assert!(manager.remove(id));
                    }
                }
                Op::RemoveUnknown => {
                    let before = manager.len();
                    prop_assert!(!manager.remove(uuid::Uuid::new_v4()));
                    prop_assert_eq!(manager.len(), before);
                }
                Op::Clear => {
                    manager.clear();
                    prop_assert!(manager.is_empty());
                }
            }

            prop_assert!(manager.len() <= 3);
            prop_assert_eq!(registry.live_count(), manager.len());
        }

        drop(manager);

        prop_assert_eq!(registry.live_count(), 0);
        prop_assert_eq!(registry.extra_release_count(), 0);
        for (id, count) in registry.release_counts() {
            prop_assert_eq!(count, 1, "preview {} released {} times", id, count);
        }
    });
}

/// A batch larger than the free slots never partially applies
#[test]
fn prop_over_cap_batch_is_all_or_nothing() {
    proptest!(|(existing in 0usize..=3, incoming in 1usize..6)| {
        let mut manager = AttachmentManager::with_defaults();
        manager.add(batch(existing, 0)).unwrap();

        let result = manager.add(batch(incoming, 0));
        if existing + incoming > 3 {
            prop_assert!(result.is_err());
            prop_assert_eq!(manager.len(), existing);
        } else {
            prop_assert!(result.is_ok());
            prop_assert_eq!(manager.len(), existing + incoming);
        }
    });
}
