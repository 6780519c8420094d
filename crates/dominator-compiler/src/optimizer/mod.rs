//! Optimization module
//!
//! Instruction-stream rewrites run between SSA lowering and code generation.

pub mod constant_folding;
pub mod dead_code_elimination;
pub mod static_hoisting;

// Re-export for convenience
pub use constant_folding::ConstantFolder;
pub use dead_code_elimination::DeadCodeEliminator;
pub use static_hoisting::StaticHoister;

use dominator_core::ir::Program;

/// Which passes run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizerOptions {
    pub dead_code_elimination: bool,
    pub constant_folding: bool,
    pub static_hoisting: bool,
}

impl Default for OptimizerOptions {
    fn default() -> Self {
        Self {
            dead_code_elimination: true,
            constant_folding: true,
            static_hoisting: true,
        }
    }
}

impl OptimizerOptions {
    /// Every pass disabled
    pub fn none() -> Self {
        Self {
            dead_code_elimination: false,
            constant_folding: false,
            static_hoisting: false,
        }
    }
}

/// Runs the enabled passes: dead code, then constant folding, then static hoisting
pub struct Optimizer {
    options: OptimizerOptions,
    dead_code_eliminator: DeadCodeEliminator,
    constant_folder: ConstantFolder,
    static_hoister: StaticHoister,
}

impl Optimizer {
    pub fn new() -> Self {
        Self::with_options(OptimizerOptions::default())
    }

    pub fn with_options(options: OptimizerOptions) -> Self {
        Self {
            options,
            dead_code_eliminator: DeadCodeEliminator::new(),
            constant_folder: ConstantFolder::new(),
            static_hoister: StaticHoister::new(),
        }
    }

    pub fn options(&self) -> &OptimizerOptions {
        &self.options
    }

    /// Optimize a program
    pub fn optimize(&self, program: &Program) -> Program {
        let mut program = program.clone();

        if self.options.dead_code_elimination {
            program = self.dead_code_eliminator.optimize(&program);
        }
        if self.options.constant_folding {
            program = self.constant_folder.fold(&program);
        }
        if self.options.static_hoisting {
            program = self.static_hoister.hoist(&program);
        }

        program
    }
}

impl Default for Optimizer {
    fn default() -> Self {
        Self::new()
    }
}
