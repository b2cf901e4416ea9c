//! Recover touch events from a geth struct-log trace.
//!
//! The walker tracks the call frame stack by `depth`. Each frame carries the
//! address whose storage `SLOAD`/`SSTORE` operate on. Frames created by
//! `CREATE`/`CREATE2` only learn their address when they return, so their
//! touches are resolved after the whole trace has been walked.

use crate::replay::TouchEvent;
use crate::utils::config::ACCOUNT_TOUCH_KEY;
use alloy_primitives::{Address, TxHash, B256, U256};
use log::debug;
use serde::{Deserialize, Serialize};

/// One step of the default struct logger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructLog {
    pub op: String,
    pub depth: u64,
    /// Hex words, bottom first; absent when the stack capture is disabled
    #[serde(default)]
    pub stack: Option<Vec<String>>,
}

impl StructLog {
    /// Stack item `n` counted from the top (0 = top)
    fn stack_item(&self, n: usize) -> Option<B256> {
        let stack = self.stack.as_ref()?;
        let index = stack.len().checked_sub(n + 1)?;
        parse_word(&stack[index])
    }
}

/// Transaction being walked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxContext {
    pub hash: TxHash,
    pub from: Address,
    /// `None` for contract creation
    pub to: Option<Address>,
    /// Address of the deployed contract, for creation transactions
    pub created: Option<Address>,
}

#[derive(Debug, Clone, Copy)]
enum Target {
    Known(Address),
    /// Index into the creation resolution table
    Creating(usize),
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    storage: Target,
    creation: Option<usize>,
}

/// Walk a transaction's struct logs and produce its touch events, in order
///
/// **Public** - the RPC engine feeds every transaction of a block through this
///
/// Touches inside a frame whose creation failed (zero address on return) are
/// dropped.
pub fn walk_transaction(tx: &TxContext, logs: &[StructLog]) -> Vec<TouchEvent> {
    let mut created: Vec<Option<Address>> = Vec::new();
    let mut touches: Vec<(Target, B256)> = vec![(Target::Known(tx.from), ACCOUNT_TOUCH_KEY)];

    let root = match tx.to.or(tx.created) {
        Some(address) => Target::Known(address),
        None => {
            created.push(None);
            Target::Creating(0)
        }
    };
    touches.push((root, ACCOUNT_TOUCH_KEY));

    let mut frames = vec![Frame {
        storage: root,
        creation: None,
    }];
    let mut entering: Option<Frame> = None;

    for log in logs {
        let depth = log.depth.max(1) as usize;

        if depth > frames.len() {
            if let Some(frame) = entering.take() {
                frames.push(frame);
            }
        } else {
            while frames.len() > depth {
                let Some(frame) = frames.pop() else { break };
                if let Some(slot) = frame.creation {
                    // Result of CREATE is on the caller's stack top once it resumes
                    created[slot] = log
                        .stack_item(0)
                        .map(Address::from_word)
                        .filter(|address| !address.is_zero());
                }
            }
        }
        entering = None;

        let Some(current) = frames.last().copied() else {
            break;
        };

        match log.op.as_str() {
            "SLOAD" | "SSTORE" => {
                if let Some(key) = log.stack_item(0) {
                    touches.push((current.storage, key));
                }
            }
            "BALANCE" | "EXTCODESIZE" | "EXTCODEHASH" | "EXTCODECOPY" | "SELFDESTRUCT" => {
                if let Some(word) = log.stack_item(0) {
                    touches.push((Target::Known(Address::from_word(word)), ACCOUNT_TOUCH_KEY));
                }
            }
            "CALL" | "STATICCALL" => {
                if let Some(word) = log.stack_item(1) {
                    let callee = Address::from_word(word);
                    touches.push((Target::Known(callee), ACCOUNT_TOUCH_KEY));
                    entering = Some(Frame {
                        storage: Target::Known(callee),
                        creation: None,
                    });
                }
            }
            "DELEGATECALL" | "CALLCODE" => {
                if let Some(word) = log.stack_item(1) {
                    touches.push((Target::Known(Address::from_word(word)), ACCOUNT_TOUCH_KEY));
                    entering = Some(Frame {
                        storage: current.storage,
                        creation: None,
                    });
                }
            }
            "CREATE" | "CREATE2" => {
                let slot = created.len();
                created.push(None);
                entering = Some(Frame {
                    storage: Target::Creating(slot),
                    creation: Some(slot),
                });
            }
            _ => {}
        }
    }

    let total = touches.len();
    let events: Vec<TouchEvent> = touches
        .into_iter()
        .filter_map(|(target, storage_key)| {
            let address = match target {
                Target::Known(address) => address,
                Target::Creating(slot) => created.get(slot).copied().flatten()?,
            };
            Some(TouchEvent {
                tx_hash: tx.hash,
                address,
                storage_key,
            })
        })
        .collect();

    if events.len() < total {
        debug!(
            "Dropped {} touches of unresolved creations in {}",
            total - events.len(),
            tx.hash
        );
    }

    events
}

/// Parse a stack word, with or without `0x`
fn parse_word(word: &str) -> Option<B256> {
    let digits = word.strip_prefix("0x").unwrap_or(word);
    if digits.is_empty() {
        return Some(B256::ZERO);
    }
    U256::from_str_radix(digits, 16).ok().map(B256::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn step(op: &str, depth: u64, stack: &[&str]) -> StructLog {
        StructLog {
            op: op.to_string(),
            depth,
            stack: Some(stack.iter().map(|s| s.to_string()).collect()),
        }
    }

    fn word(address: Address) -> String {
        format!("0x{}", alloy_primitives::hex::encode(address.as_slice()))
    }

    fn tx(to: Option<Address>) -> TxContext {
        TxContext {
            hash: B256::repeat_byte(0xee),
            from: Address::repeat_byte(0x01),
            to,
            created: None,
        }
    }

    fn touched(events: &[TouchEvent]) -> Vec<(Address, B256)> {
        events.iter().map(|e| (e.address, e.storage_key)).collect()
    }

    #[test]
    fn test_parse_word() {
        assert_eq!(parse_word("0x1"), Some(B256::with_last_byte(1)));
        assert_eq!(parse_word("ff"), Some(B256::with_last_byte(0xff)));
        assert_eq!(parse_word("0x"), Some(B256::ZERO));
        assert_eq!(parse_word("0xnothex"), None);
    }

    #[test]
    fn test_sender_recipient_and_storage() {
        let to = Address::repeat_byte(0x0a);
        let logs = vec![
            step("PUSH1", 1, &[]),
            step("SLOAD", 1, &["0x5"]),
            step("SSTORE", 1, &["0x1", "0x5"]),
        ];

        let events = walk_transaction(&tx(Some(to)), &logs);

        let slot = B256::with_last_byte(5);
        assert_eq!(
            touched(&events),
            vec![
                (Address::repeat_byte(0x01), B256::ZERO),
                (to, B256::ZERO),
                (to, slot),
                (to, slot),
            ]
        );
        assert!(events.iter().all(|e| e.tx_hash == B256::repeat_byte(0xee)));
    }

    #[test]
    fn test_call_switches_storage_context_and_delegatecall_keeps_it() {
        let to = Address::repeat_byte(0x0a);
        let callee = Address::repeat_byte(0x0b);
        let library = Address::repeat_byte(0x0c);
        let logs = vec![
            step("CALL", 1, &["0x0", "0x0", "0x0", "0x0", "0x0", &word(callee), "0xffff"]),
            step("SLOAD", 2, &["0x7"]),
            step("DELEGATECALL", 2, &["0x0", "0x0", "0x0", "0x0", &word(library), "0xffff"]),
            step("SLOAD", 3, &["0x8"]),
            step("STOP", 3, &[]),
            step("STOP", 2, &["0x1"]),
            step("SLOAD", 1, &["0x1", "0x9"]),
        ];

        let events = walk_transaction(&tx(Some(to)), &logs);

        assert_eq!(
            touched(&events)[2..].to_vec(),
            vec![
                (callee, B256::ZERO),
                (callee, B256::with_last_byte(7)),
                (library, B256::ZERO),
                (callee, B256::with_last_byte(8)),
                (to, B256::with_last_byte(9)),
            ]
        );
    }

    #[test]
    fn test_call_without_code_does_not_enter_frame() {
        let to = Address::repeat_byte(0x0a);
        let eoa = Address::repeat_byte(0x0d);
        let logs = vec![
            step("CALL", 1, &["0x0", "0x0", "0x0", "0x0", "0x0", &word(eoa), "0xffff"]),
            step("SLOAD", 1, &["0x1", "0x3"]),
        ];

        let events = walk_transaction(&tx(Some(to)), &logs);

        assert_eq!(events.last().map(|e| e.address), Some(to));
    }

    #[test]
    fn test_create_frame_is_patched_with_created_address() {
        let to = Address::repeat_byte(0x0a);
        let deployed = Address::repeat_byte(0x0f);
        let logs = vec![
            step("CREATE", 1, &["0x0", "0x0", "0x0"]),
            step("SSTORE", 2, &["0x1", "0x2"]),
            step("RETURN", 2, &["0x0", "0x0"]),
            step("POP", 1, &[&word(deployed)]),
        ];

        let events = walk_transaction(&tx(Some(to)), &logs);

        assert_eq!(touched(&events)[2], (deployed, B256::with_last_byte(2)));
    }

    #[test]
    fn test_failed_create_drops_its_touches() {
        let logs = vec![
            step("CREATE2", 1, &["0x0", "0x0", "0x0", "0x0"]),
            step("SSTORE", 2, &["0x1", "0x2"]),
            step("REVERT", 2, &["0x0", "0x0"]),
            step("POP", 1, &["0x0"]),
        ];

        let events = walk_transaction(&tx(Some(Address::repeat_byte(0x0a))), &logs);

        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_creation_transaction_uses_receipt_address() {
        let deployed = Address::repeat_byte(0x0f);
        let mut context = tx(None);
        context.created = Some(deployed);

        let events = walk_transaction(&context, &[step("SSTORE", 1, &["0x1", "0x4"])]);

        assert_eq!(
            touched(&events)[1..].to_vec(),
            vec![(deployed, B256::ZERO), (deployed, B256::with_last_byte(4))]
        );
    }

    #[test]
    fn test_account_level_opcodes() {
        let target = Address::repeat_byte(0x42);
        let logs = vec![step("BALANCE", 1, &[&word(target)])];

        let events = walk_transaction(&tx(Some(Address::repeat_byte(0x0a))), &logs);

        assert_eq!(touched(&events)[2], (target, ACCOUNT_TOUCH_KEY));
    }
}
