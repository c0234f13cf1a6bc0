// Copyright (c) Contributors to the envgen project.
// SPDX-License-Identifier: Apache-2.0

//! Emits a typed TypeScript module for a project.
//!
//! With the `zod` validator style the module exports a zod object schema,
//! the type inferred from it and the parsed binding. With `none` it exports
//! a plain interface and a binding built from `process.env` or literals.

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::{Artifact, GenerateContext, Generator};
use crate::schema::{Check, Value, VariableSchema, VariableType, format_number};
use crate::{Error, Result};

#[cfg(test)]
#[path = "./typescript_test.rs"]
mod typescript_test;

pub const NAME: &str = "typescript";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidatorStyle {
    None,
    #[default]
    Zod,
}

/// How the exported binding gets its values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum ExportMode {
    /// Read `process.env` when the module is imported.
    #[default]
    #[serde(rename = "process.env")]
    ProcessEnv,
    /// Inline resolved values; sensitive variables still come from `process.env`.
    #[serde(rename = "static")]
    Static,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct TypescriptOptions {
    /// Relative to the project root.
    pub output_path: PathBuf,
    pub validator_style: ValidatorStyle,
    pub export_mode: ExportMode,
    pub export_name: String,
}

impl Default for TypescriptOptions {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from("env.ts"),
            validator_style: ValidatorStyle::default(),
            export_mode: ExportMode::default(),
            export_name: "env".to_string(),
        }
    }
}

impl TypescriptOptions {
    pub fn validate(&self) -> Result<()> {
        if self.output_path.as_os_str().is_empty() {
            return Err(Error::InvalidConfig(
                "typescript plugin needs an output_path".to_string(),
            ));
        }
        if !is_identifier(&self.export_name) {
            return Err(Error::InvalidConfig(format!(
                "typescript export_name {:?} is not a valid identifier",
                self.export_name
            )));
        }
        Ok(())
    }

    /// Name of the exported type, `env` becomes `Env`.
    pub fn type_name(&self) -> String {
        let mut chars = self.export_name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    pub fn schema_name(&self) -> String {
        format!("{}Schema", self.export_name)
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Where a variable's value comes from in the generated module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Input {
    /// A `process.env` string.
    Env,
    /// An inlined literal of the declared type.
    Literal,
}

/// Helper functions the plain binding may need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Helper {
    Required,
    ToBoolean,
    ToArray,
}

impl Helper {
    fn source(self) -> &'static str {
        match self {
            Self::Required => concat!(
                "function required(name: string): string {\n",
                "  const value = process.env[name];\n",
                "  if (value === undefined) {\n",
                "    throw new Error(`Missing required environment variable ${name}`);\n",
                "  }\n",
                "  return value;\n",
                "}\n",
            ),
            Self::ToBoolean => concat!(
                "function toBoolean(value: string): boolean {\n",
                "  return value === \"true\" || value === \"1\";\n",
                "}\n",
            ),
            Self::ToArray => concat!(
                "function toArray(value: string): string[] {\n",
                "  return value.trim() === \"\" ? [] : value.split(\",\").map((item) => item.trim());\n",
                "}\n",
            ),
        }
    }
}

/// The `typescript` plugin.
#[derive(Debug, Clone, Default)]
pub struct TypescriptEmitter {
    options: TypescriptOptions,
}

impl TypescriptEmitter {
    pub fn new(options: TypescriptOptions) -> Self {
        Self { options }
    }

    fn input_for(&self, schema: &VariableSchema) -> Input {
        match self.options.export_mode {
            ExportMode::ProcessEnv => Input::Env,
            ExportMode::Static if schema.sensitive => Input::Env,
            ExportMode::Static => Input::Literal,
        }
    }

    /// Render the whole module.
    pub fn render(&self, ctx: &GenerateContext<'_>) -> String {
        let mut out = format!(
            "// Generated by envgen for project {}. Do not edit by hand.\n",
            quote(&ctx.config.name)
        );
        match self.options.validator_style {
            ValidatorStyle::Zod => self.render_zod(ctx, &mut out),
            ValidatorStyle::None => self.render_plain(ctx, &mut out),
        }
        out
    }

    fn render_zod(&self, ctx: &GenerateContext<'_>, out: &mut String) {
        let schema_name = self.options.schema_name();
        let type_name = self.options.type_name();
        let export_name = &self.options.export_name;

        out.push_str("\nimport { z } from \"zod\";\n\n");
        out.push_str(&format!("export const {schema_name} = z.object({{\n"));
        for (name, schema) in &ctx.config.variables {
            push_doc(out, schema);
            let input = self.input_for(schema);
            out.push_str(&format!("  {name}: {},\n", zod_expr(schema, input)));
        }
        out.push_str("});\n\n");
        out.push_str(&format!(
            "export type {type_name} = z.infer<typeof {schema_name}>;\n\n"
        ));

        match self.options.export_mode {
            ExportMode::ProcessEnv => out.push_str(&format!(
                "export const {export_name}: {type_name} = {schema_name}.parse(process.env);\n"
            )),
            ExportMode::Static => {
                out.push_str(&format!(
                    "export const {export_name}: {type_name} = {schema_name}.parse({{\n"
                ));
                for (name, schema) in &ctx.config.variables {
                    let value = if schema.sensitive {
                        Some(format!("process.env.{name}"))
                    } else {
                        ctx.variables.get(name).map(literal)
                    };
                    if let Some(value) = value {
                        out.push_str(&format!("  {name}: {value},\n"));
                    }
                }
                out.push_str("});\n");
            }
        }
    }

    fn render_plain(&self, ctx: &GenerateContext<'_>, out: &mut String) {
        let type_name = self.options.type_name();
        let export_name = &self.options.export_name;

        out.push_str(&format!("\nexport interface {type_name} {{\n"));
        for (name, schema) in &ctx.config.variables {
            push_doc(out, schema);
            let optional = if schema.is_optional() { "?" } else { "" };
            out.push_str(&format!("  {name}{optional}: {};\n", ts_type(schema.kind)));
        }
        out.push_str("}\n");

        let mut helpers = BTreeSet::new();
        let mut fields = Vec::new();
        for (name, schema) in &ctx.config.variables {
            let value = match self.input_for(schema) {
                Input::Env => Some(env_read(name, schema, &mut helpers)),
                Input::Literal => ctx.variables.get(name).map(literal),
            };
            if let Some(value) = value {
                fields.push(format!("  {name}: {value},\n"));
            }
        }

        for helper in helpers {
            out.push('\n');
            out.push_str(helper.source());
        }

        out.push_str(&format!("\nexport const {export_name}: {type_name} = {{\n"));
        for field in fields {
            out.push_str(&field);
        }
        out.push_str("};\n");
    }
}

impl Generator for TypescriptEmitter {
    fn name(&self) -> &str {
        NAME
    }

    fn generate(&self, ctx: &GenerateContext<'_>) -> Result<Vec<Artifact>> {
        self.options.validate()?;
        Ok(vec![Artifact::new(
            self.options.output_path.clone(),
            self.render(ctx),
        )])
    }
}

fn ts_type(kind: VariableType) -> &'static str {
    match kind {
        VariableType::String => "string",
        VariableType::Number => "number",
        VariableType::Boolean => "boolean",
        VariableType::Array => "string[]",
    }
}

/// Double-quoted JavaScript string literal.
fn quote(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for c in text.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            '\u{2028}' => quoted.push_str("\\u2028"),
            '\u{2029}' => quoted.push_str("\\u2029"),
            c if c.is_control() => quoted.push_str(&format!("\\u{:04x}", c as u32)),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

fn quote_list(items: &[String]) -> String {
    let items: Vec<String> = items.iter().map(|item| quote(item)).collect();
    format!("[{}]", items.join(", "))
}

/// A typed value as a TypeScript literal.
fn literal(value: &Value) -> String {
    match value {
        Value::Boolean(b) => b.to_string(),
        Value::Number(n) => format_number(*n),
        Value::String(s) => quote(s),
        Value::Array(items) => quote_list(items),
    }
}

fn push_doc(out: &mut String, schema: &VariableSchema) {
    let mut parts = Vec::new();
    if let Some(description) = &schema.description {
        parts.push(description.trim().replace("*/", "*\\/"));
    }
    if schema.sensitive {
        parts.push("Sensitive value.".to_string());
    }
    if !parts.is_empty() {
        out.push_str(&format!("  /** {} */\n", parts.join(" ")));
    }
}

fn message_arg(message: Option<&str>) -> String {
    match message {
        Some(message) => format!(", {{ message: {} }}", quote(message)),
        None => String::new(),
    }
}

/// Zod expression for one variable.
fn zod_expr(schema: &VariableSchema, input: Input) -> String {
    let mut expr = match schema.kind {
        VariableType::String => zod_string(schema),
        VariableType::Number => zod_number(schema, input),
        VariableType::Boolean => match input {
            Input::Env => concat!(
                "z.enum([\"true\", \"1\", \"false\", \"0\"])",
                ".transform((value) => value === \"true\" || value === \"1\")"
            )
            .to_string(),
            Input::Literal => "z.boolean()".to_string(),
        },
        VariableType::Array => zod_array(schema, input),
    };

    match &schema.default {
        Some(default) => {
            let default = match (input, default) {
                (Input::Env, Value::Number(n)) => format_number(*n),
                (Input::Env, other) => quote(&other.to_string()),
                (Input::Literal, other) => literal(other),
            };
            expr.push_str(&format!(".default({default})"));
        }
        None if !schema.required => expr.push_str(".optional()"),
        None => {}
    }

    if let Some(description) = &schema.description {
        expr.push_str(&format!(".describe({})", quote(description.trim())));
    }
    expr
}

fn zod_string(schema: &VariableSchema) -> String {
    let one_of = schema.rules.iter().find_map(|rule| match &rule.check {
        Check::OneOf(allowed) if !allowed.is_empty() => Some(allowed),
        _ => None,
    });
    // z.enum does not offer the string refinements, those fall back to refine
    let native = one_of.is_none();
    let mut expr = match one_of {
        Some(allowed) => format!("z.enum({})", quote_list(allowed)),
        None => "z.string()".to_string(),
    };

    for rule in &schema.rules {
        let message = message_arg(rule.message.as_deref());
        let check = match &rule.check {
            Check::MinLength(n) if native => format!(".min({n}{message})"),
            Check::MaxLength(n) if native => format!(".max({n}{message})"),
            Check::Pattern(p) if native => format!(".regex(new RegExp({}){message})", quote(p)),
            Check::MinLength(n) => format!(".refine((value) => value.length >= {n}{message})"),
            Check::MaxLength(n) => format!(".refine((value) => value.length <= {n}{message})"),
            Check::Pattern(p) => format!(
                ".refine((value) => new RegExp({}).test(value){message})",
                quote(p)
            ),
            Check::OneOf(allowed) if Some(allowed) == one_of => continue,
            Check::OneOf(allowed) => format!(
                ".refine((value) => {}.includes(value){message})",
                quote_list(allowed)
            ),
            Check::Min(_) | Check::Max(_) => continue,
        };
        expr.push_str(&check);
    }
    expr
}

fn zod_number(schema: &VariableSchema, input: Input) -> String {
    let mut expr = match input {
        Input::Env => "z.coerce.number()".to_string(),
        Input::Literal => "z.number()".to_string(),
    };
    for rule in &schema.rules {
        let message = message_arg(rule.message.as_deref());
        let check = match &rule.check {
            Check::Min(n) => format!(".min({}{message})", format_number(*n)),
            Check::Max(n) => format!(".max({}{message})", format_number(*n)),
            Check::OneOf(allowed) => format!(
                ".refine((value) => {}.includes(String(value)){message})",
                quote_list(allowed)
            ),
            _ => continue,
        };
        expr.push_str(&check);
    }
    expr
}

fn zod_array(schema: &VariableSchema, input: Input) -> String {
    let mut item = "z.string()".to_string();
    let mut array_checks = String::new();
    for rule in &schema.rules {
        let message = message_arg(rule.message.as_deref());
        match &rule.check {
            Check::MinLength(n) => array_checks.push_str(&format!(".min({n}{message})")),
            Check::MaxLength(n) => array_checks.push_str(&format!(".max({n}{message})")),
            Check::Pattern(p) => {
                item.push_str(&format!(".regex(new RegExp({}){message})", quote(p)))
            }
            Check::OneOf(allowed) => item.push_str(&format!(
                ".refine((value) => {}.includes(value){message})",
                quote_list(allowed)
            )),
            Check::Min(_) | Check::Max(_) => {}
        }
    }

    let array = format!("z.array({item}){array_checks}");
    match input {
        Input::Env => format!(
            "z.string().transform((value) => (value.trim() === \"\" ? [] : value.split(\",\").map((item) => item.trim()))).pipe({array})"
        ),
        Input::Literal => array,
    }
}

/// Plain expression reading one variable from `process.env`.
fn env_read(name: &str, schema: &VariableSchema, helpers: &mut BTreeSet<Helper>) -> String {
    let convert = |raw: String, helpers: &mut BTreeSet<Helper>| match schema.kind {
        VariableType::String => raw,
        VariableType::Number => format!("Number({raw})"),
        VariableType::Boolean => {
            helpers.insert(Helper::ToBoolean);
            format!("toBoolean({raw})")
        }
        VariableType::Array => {
            helpers.insert(Helper::ToArray);
            format!("toArray({raw})")
        }
    };

    let env = format!("process.env.{name}");
    match &schema.default {
        Some(default) => convert(format!("({env} ?? {})", quote(&default.to_string())), helpers),
        None if schema.required => {
            helpers.insert(Helper::Required);
            convert(format!("required({})", quote(name)), helpers)
        }
        None if schema.kind == VariableType::String => env,
        None => {
            let converted = convert(env.clone(), helpers);
            format!("{env} === undefined ? undefined : {converted}")
        }
    }
}
