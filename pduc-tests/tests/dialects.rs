// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use pduc_derive::protocol_inline;

// Symbolic type tokens with binstruct style length tags, unknown
// tokens and unsupported widths falling back to a single byte, and
// identifiers that are Rust keywords.
#[protocol_inline(
    r#"
Protocol:
  path: "5066/message"
  packetlist:
    - msg: C_PDU1
      format:
        - id: Type
          type: uint16
        - id: ValLen
          type: uint32
        - id: Value
          type: "[]byte"
          tag: 'bin:"len:ValLen"'
    - msg: fallback
      format:
        - { id: a, type: float32 }
        - { id: b, bytesize: 8 }
        - { id: c, bytesize: 0 }
        - { id: d, bytesize: -2 }
        - { id: e }
        - { id: f, type: byte }
    - msg: Keywords
      format:
        - { id: match, type: uint8 }
        - { id: self, type: uint8 }
        - { id: reader, type: uint8 }
        - { id: buf, bytesize: reader }
"#
)]
#[cfg(test)]
// The fallback fields are reported as deprecation warnings.
#[allow(deprecated)]
mod dialects {
    use pduc_runtime::Message;

    #[test]
    fn test_symbolic_dialect() {
        let pdu = C_PDU1 { r#type: 0xabcd, val_len: 2, value: vec![0xee, 0xff] };
        let bytes = pdu.encode_to_vec().unwrap();
        assert_eq!(bytes, vec![0xab, 0xcd, 0x00, 0x00, 0x00, 0x02, 0xee, 0xff]);
        assert_eq!(C_PDU1::decode_full(&bytes), Ok(pdu));
    }

    #[test]
    fn test_fallback_to_single_byte() {
        let message = Fallback { a: 1, b: 2, c: 3, d: 4, e: 5, f: 6 };
        assert_eq!(message.encoded_len(), 6);
        let bytes = message.encode_to_vec().unwrap();
        assert_eq!(bytes, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(Fallback::decode_full(&bytes), Ok(message));
    }

    #[test]
    fn test_keyword_identifiers() {
        let message = Keywords { r#match: 1, self_: 2, reader: 1, buf: vec![9] };
        let bytes = message.encode_to_vec().unwrap();
        assert_eq!(bytes, vec![1, 2, 1, 9]);
        assert_eq!(Keywords::decode_full(&bytes), Ok(message));
    }

    #[test]
    fn test_default_values() {
        assert_eq!(C_PDU1::default(), C_PDU1 { r#type: 0, val_len: 0, value: vec![] });
        assert_eq!(C_PDU1::default().encode_to_vec(), Ok(vec![0; 6]));
    }
}
