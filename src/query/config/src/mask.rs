// Copyright 2021 Datafuse Labs
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

/// Mask a string by "******", but keep `unmask_len` of suffix.
pub fn mask_string(s: &str, unmask_len: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= unmask_len {
        s.to_string()
    } else {
        let mut masked = "*".repeat(chars.len() - unmask_len);
        masked.extend(&chars[chars.len() - unmask_len..]);
        masked
    }
}
