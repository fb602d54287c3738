use serde::{ Serialize, Deserialize };
use serde_json::{ Map, Value };

/// One renderable avatar line: spoken text plus the expression and
/// animation tags the frontend maps onto the 3D model. Tags are passed
/// through untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AvatarMessage {
    pub text: String,
    #[serde(rename = "facialExpression")]
    pub facial_expression: String,
    pub animation: String,
}

/// Client-side actions the model may request. Any other name fails to
/// parse.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FunctionName {
    ConnectWallet,
    GetWalletInfo,
    DisconnectWallet,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: FunctionName,
    #[serde(default)]
    pub params: Map<String, Value>,
}

/// The JSON object the system prompt instructs the model to emit.
/// `html_response` and `messages` are required; extra fields are ignored.
#[derive(Clone, Debug, Deserialize)]
pub struct ModelReply {
    pub html_response: String,
    pub messages: Vec<AvatarMessage>,
    #[serde(default)]
    pub function_call: Option<FunctionCall>,
}

/// Outward response shape served to the frontend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub messages: Vec<AvatarMessage>,
    pub html_response: String,
    pub function_call: Option<FunctionCall>,
}
