//! Rewrites machine-generated Thrift JavaScript into AMD-loadable modules.
//!
//! The Thrift compiler emits browser bindings as plain scripts that install a
//! namespace object on the global scope. To load them with RequireJS the
//! pipeline wraps each artifact in a `define(...)` module, removes the
//! now-pointless namespace guard, and normalizes loose equality so the result
//! is lint-clean under strict mode. Each artifact kind has its own rewrite:
//! the rules differ in how the namespace identifier is found and which
//! dependencies the wrapper declares.

use regex::Regex;

/// Lint directives prepended to every wrapped artifact.
const LINT_DIRECTIVES: &str = "/*global define */\n/*jslint white:true */";

/// The kind of generated artifact being rewritten.
///
/// Determines the namespace-capture rule and the dependency list declared by
/// the module wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// `<service>_types.js`: struct/exception definitions guarded by
    /// `if (typeof NS === 'undefined') { NS = {}; }`.
    ServiceTypes,
    /// `<Service>Service.js`: the generated client stubs, which attach to
    /// the namespace declared by the types artifact.
    ServiceClient,
    /// The vendored Thrift browser runtime (`thrift.js`), a plain
    /// `var Thrift = ...` library depending only on jQuery.
    RuntimeLibrary,
}

/// Apply the rewrite for `kind` to `content` and return the wrapped module
/// source. Pure text transformation, no I/O.
///
/// Fails when the namespace identifier (or, for the types artifact, the
/// namespace guard idiom) cannot be found; in that case nothing is produced,
/// since emitting a module without an export would break the loader at
/// runtime.
pub fn transform_artifact(kind: ArtifactKind, content: &str) -> Result<String, String> {
    match kind {
        ArtifactKind::ServiceTypes => transform_service_types(content),
        ArtifactKind::ServiceClient => transform_service_client(content),
        ArtifactKind::RuntimeLibrary => transform_runtime_library(content),
    }
}

fn transform_service_types(content: &str) -> Result<String, String> {
    // The namespace identifier sits in the first guard line, e.g.
    // `if (typeof taxon === 'undefined') {`.
    let namespace = capture_first(r"(?m)^if \(typeof ([^\s+]+)", content).ok_or_else(|| {
        "Failed to locate the namespace declaration in the types artifact \
         (expected a leading `if (typeof NS ...` guard)"
            .to_string()
    })?;

    let guard_re = Regex::new(r"if \(typeof (\S+) === 'undefined'\) \{\n\s*\S+ = \{\};\n\}")
        .map_err(|err| format!("Invalid guard pattern: {err}"))?;
    if !guard_re.is_match(content) {
        return Err(
            "Namespace guard idiom not found in the types artifact; refusing to wrap \
             (was this file already transformed?)"
                .to_string(),
        );
    }

    // Inside a module the namespace cannot pre-exist, so the guard collapses
    // to a plain declaration. Only the first occurrence is the guard.
    let body = guard_re.replace(content, "var ${1} = {};\n");
    let body = normalize_equality(&body)?;

    let header = "define([\"thrift\"], function (Thrift) {\n\"use strict\";".to_string();
    Ok(wrap_module(&header, &body, &namespace))
}

fn transform_service_client(content: &str) -> Result<String, String> {
    // The first line-start token without slashes, dots, or whitespace is the
    // service namespace: comment lines start with `//`, and the first stub
    // assignment reads `ns.ServiceClient = ...`.
    let namespace = capture_first(r"(?m)^([^/\s.]+)", content).ok_or_else(|| {
        "Failed to locate the service namespace in the client artifact".to_string()
    })?;

    let body = normalize_equality(content)?;
    let header = format!(
        "define([\"thrift\", \"{namespace}_types\"], function (Thrift, {namespace}) {{\n\"use strict\";"
    );
    Ok(wrap_module(&header, &body, &namespace))
}

fn transform_runtime_library(content: &str) -> Result<String, String> {
    let namespace = capture_first(r"(?m)^var (.+?) = ", content).ok_or_else(|| {
        "Failed to locate the top-level `var X = ...` declaration in the runtime library"
            .to_string()
    })?;

    let body = normalize_equality(content)?;
    let header = "define([\"jquery\"], function (jQuery) {\n\"use strict\";".to_string();
    Ok(wrap_module(&header, &body, &namespace))
}

/// First capture group of `pattern` against `content`, if any.
fn capture_first(pattern: &str, content: &str) -> Option<String> {
    let re = Regex::new(pattern).ok()?;
    re.captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Rewrite loose equality/inequality to strict form.
///
/// `a == b` becomes `a === b` and `a != b` becomes `a !== b`; occurrences
/// that are already strict are left untouched. Purely textual, matching the
/// generated code's uniform spacing; string literals containing the
/// operators are rewritten too, which is acceptable for generated sources.
pub fn normalize_equality(content: &str) -> Result<String, String> {
    let eq_re =
        Regex::new(r"([^=!])==([^=])").map_err(|err| format!("Invalid equality pattern: {err}"))?;
    let neq_re =
        Regex::new(r"!=([^=])").map_err(|err| format!("Invalid inequality pattern: {err}"))?;

    let strict = eq_re.replace_all(content, "${1}===${2}");
    let strict = neq_re.replace_all(&strict, "!==${1}");
    Ok(strict.into_owned())
}

/// Concatenate the fixed module blocks: lint directives, wrapper header,
/// rewritten body, and a footer returning the namespace object.
fn wrap_module(header: &str, body: &str, namespace: &str) -> String {
    let footer = format!("return {namespace};\n}});");
    [LINT_DIRECTIVES, header, body, footer.as_str()].join("\n")
}
