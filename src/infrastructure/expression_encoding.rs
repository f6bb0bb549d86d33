// Serialization of expression graphs into the Earth Engine REST format
//
// {"result": "<id>", "values": {"<id>": <ValueNode>, ...}}
//
// Nodes are inlined where the format allows it. Function bodies must be
// references, so every lambda body gets its own entry in `values`.
use crate::domain::expression::Expr;
use serde_json::{Map, Value as Json, json};

pub fn encode_expression(expr: &Expr) -> Json {
    let mut encoder = GraphEncoder::default();
    let root = encoder.node(expr);
    let result = encoder.push(root);
    json!({
        "result": result,
        "values": encoder.values,
    })
}

#[derive(Default)]
struct GraphEncoder {
    values: Map<String, Json>,
}

impl GraphEncoder {
    fn push(&mut self, node: Json) -> String {
        let id = self.values.len().to_string();
        self.values.insert(id.clone(), node);
        id
    }

    fn node(&mut self, expr: &Expr) -> Json {
        match expr {
            Expr::Constant(value) => json!({ "constantValue": value }),
            Expr::Call { function, args } => {
                let mut arguments = Map::new();
                for (name, arg) in args {
                    arguments.insert(name.to_string(), self.node(arg));
                }
                json!({
                    "functionInvocationValue": {
                        "functionName": function,
                        "arguments": arguments,
                    }
                })
            }
            Expr::Lambda { params, body } => {
                let body = self.node(body);
                let body_id = self.push(body);
                json!({
                    "functionDefinitionValue": {
                        "argumentNames": params,
                        "body": body_id,
                    }
                })
            }
            Expr::ArgRef(name) => json!({ "argumentReference": name }),
            Expr::Array(items) => {
                let values: Vec<Json> = items.iter().map(|item| self.node(item)).collect();
                json!({ "arrayValue": { "values": values } })
            }
        }
    }
}
