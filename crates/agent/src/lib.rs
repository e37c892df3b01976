//! Order-taking agent for the tabletalk voice assistant.
//!
//! A turn runs a fixed loop over one session:
//! 1. **Classification** (`intent`) - casual, clear-cart, checkout or order
//! 2. **Extraction** (`extraction`) - utterance to menu keys and quantities
//! 3. **Merge** - extracted items are added to the session cart (`tabletalk-core`)
//! 4. **Reply** (`response`) - generated text, or a canned reply
//!
//! # Key Types
//!
//! - `AgentRuntime` - turn orchestrator (see `runtime` module)
//! - `LlmClient` - pluggable language service; `GeminiClient` is the HTTP implementation
//! - `OrderExtractor` / `ResponseComposer` - the two call sites of the language service
//!
//! The language service only translates text. Menu keys, quantities and
//! totals are always validated and computed locally, and every service
//! failure has a deterministic fallback.

pub mod extraction;
pub mod gemini;
pub mod intent;
pub mod llm;
pub mod prompts;
pub mod response;
pub mod runtime;
