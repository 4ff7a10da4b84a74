//! Top-level pipeline: source text in, tape-machine program text out.
//!
//! Mirrors the teacher's `compile`/`compile_with_options` split so the CLI
//! and tests can reach for sensible defaults or override them without a
//! builder type.

use crate::abi;
use crate::ast::{Decl, Type};
use crate::bf;
use crate::codegen::{Emitter, FunctionInfo, FunctionTable};
use crate::error::{Error, Position, Result};
use crate::lexer::Lexer;
use crate::parser;

/// Cells a generated program may use before `Error::Capacity` is raised.
/// Generous enough for the example programs in section 8 many times over;
/// exists so a runaway program (e.g. deeply inlined calls) fails fast with
/// a diagnostic instead of producing a multi-megabyte instruction stream.
pub const DEFAULT_CAPACITY_LIMIT: usize = 1 << 20;

#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Run the peephole optimizer (O) before rendering.
    pub optimize: bool,
    /// Which passes run when `optimize` is set; disabling one here without
    /// clearing `optimize` is how the CLI isolates a single pass.
    pub optimizations: bf::OptimizationFlags,
    /// Render with `# note` annotations instead of minifying.
    pub verbose: bool,
    /// Ceiling passed to `TapeAllocator::check_capacity`.
    pub capacity_limit: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            optimize: false,
            optimizations: bf::OptimizationFlags::default(),
            verbose: false,
            capacity_limit: DEFAULT_CAPACITY_LIMIT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompileOutput {
    /// The rendered program: minified opcodes, or `# note`-annotated text
    /// when `CompileOptions::verbose` was set.
    pub source: String,
    /// Peak cell count the generated program touches.
    pub cell_count: usize,
}

pub fn compile(source: &str) -> Result<String> {
    compile_with_options(source, &CompileOptions::default()).map(|out| out.source)
}

pub fn compile_with_options(source: &str, options: &CompileOptions) -> Result<CompileOutput> {
    tracing::debug!(bytes = source.len(), "lexing");
    let tokens = Lexer::new(source).tokenize()?;
    tracing::debug!(tokens = tokens.len(), "parsing");
    let program = parser::parse(tokens)?;
    tracing::debug!(decls = program.decls.len(), "collecting declarations");

    let functions = collect_functions(&program.decls)?;
    let main = functions
        .get("main")
        .cloned()
        .ok_or_else(|| Error::semantic(Position::default(), "program has no 'main' function"))?;
    if !main.params.is_empty() {
        return Err(Error::semantic(main.pos, "'main' must take no parameters"));
    }

    let mut emitter = Emitter::new(&functions, options.verbose);
    emit_globals(&mut emitter, &program.decls)?;
    emit_main(&mut emitter, &main)?;
    emitter.check_capacity(options.capacity_limit)?;

    let cell_count = emitter.tape.high_water_mark();
    let mut program = emitter.program;
    check_bracket_balance(&program, "before optimization")?;

    if options.optimize {
        tracing::debug!(ops_before = program.ops.len(), "running peephole optimizer");
        bf::optimize_with_flags(&mut program, &options.optimizations);
        tracing::debug!(ops_after = program.ops.len(), "optimizer finished");
    }
    check_bracket_balance(&program, "after optimization")?;

    let source = if options.verbose {
        bf::render_annotated(&program)
    } else {
        bf::minify(&program)
    };

    Ok(CompileOutput { source, cell_count })
}

/// Every emitter helper is expected to leave brackets balanced; this is a
/// sanity check on the emitter itself, not on user input. `debug_assert!`
/// catches it immediately in development; the `Error::Internal` path means
/// a release build fails the compile cleanly instead of handing the tape
/// machine a program that loops on mismatched brackets forever.
fn check_bracket_balance(program: &bf::Program, when: &str) -> Result<()> {
    debug_assert!(
        program.is_bracket_balanced(),
        "unbalanced brackets {when}"
    );
    if program.is_bracket_balanced() {
        Ok(())
    } else {
        Err(Error::internal(format!("unbalanced brackets {when}")))
    }
}

/// Records every function's signature and body without emitting anything;
/// call sites look functions up here and inline on demand.
fn collect_functions(decls: &[Decl]) -> Result<FunctionTable> {
    let mut functions = FunctionTable::new();
    for decl in decls {
        if let Decl::Function { name, ret_type, params, body, pos } = decl {
            let info = FunctionInfo {
                ret_type: *ret_type,
                params: params.clone(),
                body: body.clone(),
                pos: *pos,
            };
            if functions.insert(name.clone(), info).is_some() {
                return Err(Error::semantic(*pos, format!("redefinition of function '{name}'")));
            }
        }
    }
    Ok(functions)
}

/// Declares every global and emits its initializer, in source order, ahead
/// of `main`'s own frame.
fn emit_globals(emitter: &mut Emitter<'_>, decls: &[Decl]) -> Result<()> {
    for decl in decls {
        match decl {
            Decl::GlobalVar { name, ty, init, pos } => {
                let cell = emitter.declare_global(name, *ty, *pos)?;
                if let Some(expr) = init {
                    emitter.note(format!("global '{name}'"));
                    emitter.emit_expr_into(cell, expr)?;
                }
            }
            Decl::GlobalArray { name, elem, len, init, pos } => {
                if init.len() > *len {
                    return Err(Error::semantic(
                        *pos,
                        format!("array '{name}' given {} initializers but declared with {len} elements", init.len()),
                    ));
                }
                let ty = Type::Array(*elem, *len);
                let cell = emitter.declare_global(name, ty, *pos)?;
                let elem0 = cell + abi::ARRAY_WALK_LANE_CELLS;
                emitter.note(format!("global array '{name}'"));
                for (k, expr) in init.iter().enumerate() {
                    emitter.emit_expr_into(elem0 + k, expr)?;
                }
            }
            Decl::Function { .. } => {}
        }
    }
    Ok(())
}

/// Opens `main`'s frame directly (it is never reached through
/// [`Emitter::emit_call_expr`] since nothing calls it) and runs its body.
fn emit_main(emitter: &mut Emitter<'_>, main: &FunctionInfo) -> Result<()> {
    emitter.note("main");
    emitter.enter_call("main");
    // A fresh scope, the same as any inlined call, so a local can shadow a
    // global by name. The tape's cells are left unreclaimed on exit: this
    // is the last frame the program ever opens, so there is no sibling
    // call waiting to reuse the space.
    emitter.scope.enter();
    let frame = emitter.tape.allocate_named(abi::FIRST_PARAM);
    emitter.emit_set_const(frame + abi::RETURN_FLAG, 1);
    emitter.emit_zero(frame + abi::RETURN_VALUE);
    emitter.push_return_flag(frame);

    emitter.emit_stmt_seq(&main.body)?;

    emitter.pop_return_flag();
    emitter.scope.exit();
    emitter.exit_call();
    Ok(())
}
