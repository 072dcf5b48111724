// Chat Ports - 端口定义

mod inference_port;

pub use inference_port::*;
