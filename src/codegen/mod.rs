//! Code generation for explicit template specializations.
//!
//! Compiling the fully generic eliminator together with every fixed-size
//! variant in one translation unit takes gigabytes of memory. The units
//! generated here split that work: each fixed-size variant is explicitly
//! instantiated in its own file, and a factory picks among them at
//! runtime.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                         Generation Pipeline                          │
//! ├──────────────────────────────────────────────────────────────────────┤
//! │                                                                      │
//! │  ┌──────────────┐                  ┌──────────────────────────────┐  │
//! │  │ Catalog      │──── units ──────►│ generated/<name>_2_2_2.cc    │  │
//! │  │ (row, e, f)  │                  │ generated/<name>_2_3_d.cc    │  │
//! │  │ in order     │                  │ ...                          │  │
//! │  └──────────────┘                  │ generated/<name>_d_d_d.cc    │  │
//! │         │                          │   (umbrella, always built)   │  │
//! │         │                          └──────────────────────────────┘  │
//! │         │                                                            │
//! │         └──────── factory ────────►┌──────────────────────────────┐  │
//! │  ┌──────────────┐                  │ <name>.cc                    │  │
//! │  │ TemplateSet  │─────────────────►│   if (sizes == 2,2,2) ...    │  │
//! │  └──────────────┘                  │   if (sizes == 2,3,*) ...    │  │
//! │                                    │   fallback: <d,d,d>          │  │
//! │                                    └──────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every unit starts with the license header and the autogenerated
//! banner. Per-specialization units and factory branches sit behind
//! `CERES_RESTRICT_SCHUR_SPECIALIZATION`; defining it leaves a build with
//! only the umbrella unit and the factory fallback, which is slower but
//! still correct.

pub mod factory;
pub mod generator;
pub mod template;
pub mod units;


pub use factory::render_factory;
pub use generator::{generate_all, CodeGenConfig, CodeGenerator};
pub use template::{TemplateError, TemplateSet};
pub use units::{GeneratedUnit, UnitKind};
