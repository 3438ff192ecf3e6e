//! Client code generation for the main service.

use std::fmt::Write as _;

use ironidl_core::{CallMode, FuncType};
use ironidl_schema::IdlProg;

use super::names::{NameAllocator, escape_identifier, to_pascal_case, to_snake_case};
use super::types::TypeGenerator;
use crate::config::Config;
use crate::error::CodegenError;

/// Generator for the client struct of a program's service.
pub struct ServiceGenerator<'a> {
    prog: &'a IdlProg,
    config: &'a Config,
}

/// A resolved method signature ready to render.
struct MethodSig {
    idl_name: String,
    rust_name: String,
    mode: CallMode,
    args: Vec<String>,
    rets: Vec<String>,
}

impl<'a> ServiceGenerator<'a> {
    /// Creates a new service generator.
    #[must_use]
    pub const fn new(prog: &'a IdlProg, config: &'a Config) -> Self {
        Self { prog, config }
    }

    /// Generates the client, or nothing if the program declares no service.
    ///
    /// Types used in method signatures are resolved through `types`, which
    /// may hoist new declarations.
    ///
    /// # Errors
    /// Returns `CodegenError` if the agent field name collides with the
    /// destination field.
    pub fn generate(&self, types: &mut TypeGenerator<'_>) -> Result<String, CodegenError> {
        if self.prog.service.is_none() {
            return Ok(String::new());
        }

        if self.config.agent_name == "destination" {
            return Err(CodegenError::generation(
                "agent field name collides with `destination`",
            ));
        }
        let agent = escape_identifier(&self.config.agent_name);
        let mut method_names = NameAllocator::with_reserved([
            "new",
            "with_destination",
            "destination",
            self.config.agent_name.as_str(),
        ]);
        let mut methods = Vec::new();
        for (name, func) in self.prog.methods() {
            methods.push(self.method_sig(types, &mut method_names, name, func));
        }

        for item in ["Agent", "CallError", "CallMode", "Principal"] {
            types.import(item);
        }
        if !methods.is_empty() {
            types.import("ArgBuilder");
        }
        if methods.iter().any(|method| method.mode != CallMode::Oneway) {
            types.import("ReplyDecoder");
        }

        let binding = &self.config.binding_name;
        let service_name = self
            .prog
            .service
            .as_ref()
            .and_then(|service| service.name.as_deref())
            .unwrap_or(binding);

        let mut output = String::new();
        if let Some(destination) = &self.config.destination {
            let _ = writeln!(output, "/// Default destination of [`{binding}`].");
            let _ = writeln!(output, "pub const DESTINATION: &str = {:?};\n", destination.to_string());
        }

        let _ = writeln!(output, "/// Client for the `{service_name}` service.");
        output.push_str("#[derive(Debug, Clone)]\n");
        let _ = writeln!(output, "pub struct {binding}<Transport: Agent> {{");
        let _ = writeln!(output, "    {agent}: Transport,");
        output.push_str("    destination: Principal,\n}\n\n");

        let _ = writeln!(output, "impl<Transport: Agent> {binding}<Transport> {{");
        output.push_str(&self.constructors(&agent));
        let _ = writeln!(output, "    /// Returns the agent carrying calls.");
        let _ = writeln!(output, "    pub const fn {agent}(&self) -> &Transport {{");
        let _ = writeln!(output, "        &self.{agent}");
        output.push_str("    }\n\n");
        output.push_str("    /// Returns the principal calls are sent to.\n");
        output.push_str("    pub const fn destination(&self) -> &Principal {\n");
        output.push_str("        &self.destination\n    }\n");

        for method in &methods {
            output.push('\n');
            output.push_str(&render_method(method, &agent));
        }
        output.push_str("}\n\n");
        Ok(output)
    }

    fn constructors(&self, agent: &str) -> String {
        let mut output = String::new();
        if self.config.destination.is_some() {
            output.push_str("    /// Creates a client calling [`DESTINATION`].\n");
            output.push_str("    ///\n    /// # Errors\n");
            output.push_str("    /// Returns [`CallError`] if `DESTINATION` is not a valid principal.\n");
            let _ = writeln!(output, "    pub fn new({agent}: Transport) -> Result<Self, CallError> {{");
            output.push_str("        let destination = Principal::from_text(DESTINATION)\n");
            output.push_str("            .map_err(|err| CallError::Codec(err.into()))?;\n");
            let _ = writeln!(output, "        Ok(Self::with_destination({agent}, destination))");
            output.push_str("    }\n\n");
            output.push_str("    /// Creates a client calling `destination`.\n");
            let _ = writeln!(
                output,
                "    pub const fn with_destination({agent}: Transport, destination: Principal) -> Self {{"
            );
        } else {
            output.push_str("    /// Creates a client calling `destination`.\n");
            let _ = writeln!(
                output,
                "    pub const fn new({agent}: Transport, destination: Principal) -> Self {{"
            );
        }
        let _ = writeln!(output, "        Self {{ {agent}, destination }}");
        output.push_str("    }\n\n");
        output
    }

    fn method_sig(
        &self,
        types: &mut TypeGenerator<'_>,
        method_names: &mut NameAllocator,
        name: &str,
        func: &FuncType,
    ) -> MethodSig {
        let mut base = to_snake_case(name);
        if self.config.agent_name == base {
            base = format!("call_{base}");
        }
        let rust_name = escape_identifier(&method_names.allocate(&base));
        let hint = to_pascal_case(name);
        let args = func
            .args
            .iter()
            .enumerate()
            .map(|(i, ty)| types.rust_type(ty, None, &format!("{hint}Arg{i}")))
            .collect();
        let rets = func
            .rets
            .iter()
            .enumerate()
            .map(|(i, ty)| types.rust_type(ty, None, &format!("{hint}Ret{i}")))
            .collect();
        MethodSig {
            idl_name: name.to_string(),
            rust_name,
            mode: CallMode::from_modes(&func.modes),
            args,
            rets,
        }
    }
}

fn render_method(method: &MethodSig, agent: &str) -> String {
    let mut output = String::new();
    let oneway = method.mode == CallMode::Oneway;
    let returns = match method.rets.as_slice() {
        _ if oneway => "()".to_string(),
        [] => "()".to_string(),
        [single] => single.clone(),
        many => format!("({})", many.join(", ")),
    };
    let params: String = method
        .args
        .iter()
        .enumerate()
        .map(|(i, ty)| format!(", arg{i}: &{ty}"))
        .collect();
    let pushes: String = (0..method.args.len()).map(|i| format!(".arg(arg{i})")).collect();

    let _ = writeln!(
        output,
        "    /// Calls `{}` as {}.",
        method.idl_name,
        mode_description(method.mode)
    );
    output.push_str("    ///\n    /// # Errors\n");
    output.push_str("    /// Returns [`CallError`] if the call fails or the reply does not decode.\n");
    let _ = writeln!(
        output,
        "    pub fn {}(&self{params}) -> Result<{returns}, CallError> {{",
        method.rust_name
    );
    let _ = writeln!(output, "        let args = ArgBuilder::new(){pushes}.encode()?;");
    let _ = writeln!(
        output,
        "        {}self",
        if oneway { "" } else { "let reply = " }
    );
    let _ = writeln!(output, "            .{agent}");
    let _ = writeln!(
        output,
        "            .call(&self.destination, {:?}, CallMode::{:?}, args)",
        method.idl_name, method.mode
    );
    output.push_str("            .map_err(CallError::transport)?;\n");
    if oneway {
        output.push_str("        Ok(())\n    }\n");
        return output;
    }

    if method.rets.is_empty() {
        output.push_str("        ReplyDecoder::new(&reply)?.finish()?;\n");
        output.push_str("        Ok(())\n    }\n");
        return output;
    }
    output.push_str("        let mut reply = ReplyDecoder::new(&reply)?;\n");
    for (i, ty) in method.rets.iter().enumerate() {
        let _ = writeln!(output, "        let ret{i} = reply.read::<{ty}>()?;");
    }
    output.push_str("        reply.finish()?;\n");
    let value = match method.rets.len() {
        1 => "ret0".to_string(),
        n => format!(
            "({})",
            (0..n).map(|i| format!("ret{i}")).collect::<Vec<_>>().join(", ")
        ),
    };
    let _ = writeln!(output, "        Ok({value})");
    output.push_str("    }\n");
    output
}

const fn mode_description(mode: CallMode) -> &'static str {
    match mode {
        CallMode::Update => "an update",
        CallMode::Query => "a query",
        CallMode::Oneway => "a one-way call",
        CallMode::CompositeQuery => "a composite query",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ironidl_core::Principal;
    use ironidl_schema::parse_idl;

    const LEDGER: &str = r#"
        type Account = record { owner : principal; subaccount : opt blob };
        service ledger : {
            balance : (Account) -> (nat) query;
            transfer : (Account, nat) -> (variant { ok : nat; err : text });
            notify : (text) -> () oneway;
            ping : () -> ();
            pair : () -> (nat, text) composite_query;
        }
    "#;

    fn generate(config: &Config) -> (String, String) {
        let prog = parse_idl(LEDGER).unwrap();
        let mut types = TypeGenerator::new(&prog.table, config).unwrap();
        let declarations = types.generate().unwrap();
        let client = ServiceGenerator::new(&prog, config).generate(&mut types).unwrap();
        let hoisted = types.generate_pending().unwrap();
        (format!("{declarations}{hoisted}"), client)
    }

    #[test]
    fn test_client_struct() {
        let (_, client) = generate(&Config::new().binding_name("Ledger"));
        assert!(client.contains("/// Client for the `ledger` service."));
        assert!(client.contains("pub struct Ledger<Transport: Agent> {\n    agent: Transport,\n    destination: Principal,\n}"));
        assert!(client.contains("pub const fn new(agent: Transport, destination: Principal) -> Self {"));
        assert!(!client.contains("DESTINATION"));
    }

    #[test]
    fn test_query_method() {
        let (_, client) = generate(&Config::new());
        assert!(client.contains("pub fn balance(&self, arg0: &Account) -> Result<u128, CallError> {"));
        assert!(client.contains(".call(&self.destination, \"balance\", CallMode::Query, args)"));
        assert!(client.contains("let ret0 = reply.read::<u128>()?;"));
    }

    #[test]
    fn test_oneway_skips_reply() {
        let (_, client) = generate(&Config::new());
        let notify = client.split("pub fn notify").nth(1).unwrap();
        let notify = notify.split("\n    }\n").next().unwrap();
        assert!(notify.contains("CallMode::Oneway"));
        assert!(!notify.contains("ReplyDecoder"));
    }

    #[test]
    fn test_multiple_returns_and_hoisting() {
        let (declarations, client) = generate(&Config::new());
        assert!(client.contains("pub fn pair(&self) -> Result<(u128, String), CallError> {"));
        assert!(client.contains("CallMode::CompositeQuery"));
        assert!(client.contains("pub fn transfer(&self, arg0: &Account, arg1: &u128) -> Result<TransferRet0, CallError> {"));
        assert!(declarations.contains("pub enum TransferRet0 {"));
        assert!(client.contains("pub fn ping(&self) -> Result<(), CallError> {"));
    }

    #[test]
    fn test_fixed_destination() {
        let config = Config::new().destination(Principal::management());
        let (_, client) = generate(&config);
        assert!(client.contains("pub const DESTINATION: &str = \"aaaaa-aa\";"));
        assert!(client.contains("pub fn new(agent: Transport) -> Result<Self, CallError> {"));
        assert!(client.contains("pub const fn with_destination(agent: Transport, destination: Principal) -> Self {"));
    }

    #[test]
    fn test_method_name_collision() {
        let prog = parse_idl("service : { agent : () -> (); new : () -> () }").unwrap();
        let config = Config::new();
        let mut types = TypeGenerator::new(&prog.table, &config).unwrap();
        let client = ServiceGenerator::new(&prog, &config).generate(&mut types).unwrap();
        assert!(client.contains("pub fn call_agent(&self)"));
        assert!(client.contains("pub fn new2(&self)"));
    }

    #[test]
    fn test_no_service() {
        let prog = parse_idl("type A = nat;").unwrap();
        let config = Config::new();
        let mut types = TypeGenerator::new(&prog.table, &config).unwrap();
        let client = ServiceGenerator::new(&prog, &config).generate(&mut types).unwrap();
        assert!(client.is_empty());
    }
}
